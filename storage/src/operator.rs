use bytes::Bytes;
use object_store::{path::Path, GetResult, ObjectStore};
use tracing::instrument;

use crate::error::{Error, Result};

pub struct Operator {
    pub store: Box<dyn ObjectStore>,
    pub path_prefix: Option<Path>,
}

impl Operator {
    /// In-memory operator for tests.
    pub fn memory() -> Self {
        Self {
            store: Box::new(object_store::memory::InMemory::new()),
            path_prefix: None,
        }
    }

    fn make_full_path(&self, location: &str) -> Path {
        match &self.path_prefix {
            Some(prefix) => Path::from(format!("{prefix}/{location}")),
            None => Path::from(location),
        }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, location: &str) -> Result<GetResult> {
        let p = self.make_full_path(location);
        self.store.get(&p).await.map_err(Error::from)
    }

    pub async fn get_bytes(&self, location: &str) -> Result<Bytes> {
        let result = self.get(location).await?;
        result.bytes().await.map_err(Error::from)
    }

    #[instrument(skip(self, bytes))]
    pub async fn put(&self, location: &str, bytes: Bytes) -> Result<()> {
        let p = self.make_full_path(location);
        self.store.put(&p, bytes).await.map_err(Error::from)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, location: &str) -> Result<()> {
        let p = self.make_full_path(location);
        self.store.delete(&p).await.map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete_round_trip() {
        let operator = Operator::memory();
        operator
            .put("prj/v1/report.pdf", Bytes::from_static(b"contents"))
            .await
            .unwrap();

        let bytes = operator.get_bytes("prj/v1/report.pdf").await.unwrap();
        assert_eq!(bytes.as_ref(), b"contents");

        operator.delete("prj/v1/report.pdf").await.unwrap();
        assert!(operator.get("prj/v1/report.pdf").await.is_err());
    }

    #[tokio::test]
    async fn prefix_is_applied_to_every_path() {
        let operator = Operator {
            store: Box::new(object_store::memory::InMemory::new()),
            path_prefix: Some(Path::from("uploads")),
        };

        operator
            .put("prj/v1/a.txt", Bytes::from_static(b"x"))
            .await
            .unwrap();

        let direct = operator
            .store
            .get(&Path::from("uploads/prj/v1/a.txt"))
            .await
            .unwrap();
        assert_eq!(direct.bytes().await.unwrap().as_ref(), b"x");
    }
}
