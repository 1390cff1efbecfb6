use crate::usage::{AlgorithmUsage, LibraryDetection};

#[derive(sqlx::FromRow)]
pub(crate) struct AlgorithmRow {
    pub(crate) content_hash: String,
    pub(crate) algorithm: String,
    pub(crate) strength: String,
}
impl From<AlgorithmRow> for AlgorithmUsage {
    fn from(row: AlgorithmRow) -> Self {
        Self {
            content_hash: row.content_hash,
            algorithm: row.algorithm,
            strength: row.strength,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct DetectionRow {
    pub(crate) content_hash: String,
    pub(crate) detection_id: String,
    pub(crate) name: String,
    #[sqlx(default)]
    pub(crate) description: Option<String>,
    #[sqlx(default)]
    pub(crate) url: Option<String>,
    #[sqlx(default)]
    pub(crate) category: Option<String>,
}
impl From<DetectionRow> for LibraryDetection {
    fn from(row: DetectionRow) -> Self {
        Self {
            content_hash: row.content_hash,
            detection_id: row.detection_id,
            name: row.name,
            description: row.description,
            url: row.url,
            category: row.category,
        }
    }
}
