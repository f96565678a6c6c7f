use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Record<Video>,
    pub title: String,
    /// Name of the stored file, only for uploaded videos.
    #[serde(default)]
    pub filename: Option<String>,
    pub url: String,
    pub created_at: Timestamp,
}

/// Where the content of a video lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A file stored by this service and served from `url`.
    Upload { filename: String, url: String },
    /// A video hosted elsewhere.
    Link { url: url::Url },
}

define_table!("videos" : Video);

define_relation! {
    Video > all() > Vec<Video>
        where "SELECT * FROM videos ORDER BY createdAt ASC"
}

define_relation! {
    Video > get(record: &Record<Video>) > Option<Video>
        where "SELECT * FROM $record"
}

define_relation! {
    Video > insert(title: &str, filename: Option<&str>, url: &str, created_at: Timestamp) > Option<Video>
        where "CREATE videos SET title = $title, filename = $filename, url = $url, createdAt = $created_at RETURN AFTER"
}

impl Video {
    /// Stores a new video, the database assigns the id.
    pub async fn create(title: &str, source: &Source, db: &Database) -> Result<Video, DatabaseQueryError> {
        let (filename, url) = match source {
            Source::Upload { filename, url } => (Some(filename.as_str()), url.as_str()),
            Source::Link { url } => (None, url.as_str()),
        };

        Video::insert(title, filename, url, now(), db)
            .await?
            .context(NoResultsSnafu)
    }

    /// Looks a video up by the id clients were given.
    pub async fn find(key: &str, db: &Database) -> Result<Option<Video>, DatabaseQueryError> {
        Video::get(&Record::new(key), db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::SurrealConfig;

    async fn database() -> Database {
        Database::connect(&SurrealConfig::in_memory()).await.unwrap()
    }

    fn link(url: &str) -> Source {
        Source::Link {
            url: url.parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn create_and_find() {
        let db = database().await;

        let source = Source::Upload {
            filename: "3f1c.mp4".to_string(),
            url: "/uploads/3f1c.mp4".to_string(),
        };
        let video = Video::create("Lecture 1", &source, &db).await.unwrap();

        assert_eq!(video.title, "Lecture 1");
        assert_eq!(video.filename.as_deref(), Some("3f1c.mp4"));
        assert_eq!(video.url, "/uploads/3f1c.mp4");

        let found = Video::find(&video.id.key(), &db).await.unwrap();
        assert_eq!(found, Some(video));
    }

    #[tokio::test]
    async fn linked_videos_have_no_filename() {
        let db = database().await;

        let video = Video::create("Trailer", &link("https://www.youtube.com/watch?v=aqz-KE-bpKQ"), &db)
            .await
            .unwrap();

        assert_eq!(video.filename, None);
        assert_eq!(video.url, "https://www.youtube.com/watch?v=aqz-KE-bpKQ");
    }

    #[tokio::test]
    async fn unknown_id_is_none() {
        let db = database().await;
        assert_eq!(Video::find("missing", &db).await.unwrap(), None);
    }

    #[tokio::test]
    async fn all_lists_in_creation_order() {
        let db = database().await;

        for title in ["first", "second", "third"] {
            Video::create(title, &link("https://example.com/v.mp4"), &db)
                .await
                .unwrap();
        }

        let titles: Vec<String> = Video::all(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|video| video.title)
            .collect();

        assert_eq!(titles, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn stored_columns_are_camel_case() {
        #[derive(Deserialize)]
        struct Columns {
            #[serde(rename = "createdAt")]
            created_at: Timestamp,
        }

        let db = database().await;
        let video = Video::create("Trailer", &link("https://example.com/v.mp4"), &db)
            .await
            .unwrap();

        let columns: Vec<Columns> = db.sql("SELECT createdAt FROM videos").fetch_first().await.unwrap();

        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].created_at, video.created_at);
    }
}
