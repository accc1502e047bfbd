//! Asset importer: turns a source file reference into a store-local asset.

use crate::error::Result;
use crate::models::AssetRef;
use crate::source::NoteSource;
use crate::store::BlockStore;

/// Fetch `url` through the source and upload it to the store.
///
/// A transport failure is not an error: it is logged and yields `None` so the
/// caller can skip the file. Upload failures propagate. Nothing is retried here.
pub async fn import_asset<B, S>(store: &B, source: &S, url: &str) -> Result<Option<AssetRef>>
where
    B: BlockStore,
    S: NoteSource,
{
    let binary = match source.fetch_binary(url).await {
        Ok(binary) => binary,
        Err(error) => {
            tracing::warn!(%url, %error, "Skipping asset that could not be fetched");
            return Ok(None);
        }
    };

    let asset = store
        .upload_binary(&binary.media_type, &binary.bytes)
        .await?;
    tracing::debug!(%url, %asset, bytes = binary.bytes.len(), "Imported asset");
    Ok(Some(asset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use crate::store::MemoryBlockStore;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_import_uploads_payload() {
        let store = MemoryBlockStore::new();
        let source = MemorySource::new();
        source.add_binary("file/a.png", "image/png", vec![1, 2]);

        let asset = import_asset(&store, &source, "file/a.png")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            store.asset(&asset),
            Some(("image/png".to_string(), vec![1, 2]))
        );
    }

    #[tokio::test]
    async fn test_transport_failure_yields_none() {
        let store = MemoryBlockStore::new();
        let source = MemorySource::new();

        let asset = import_asset(&store, &source, "file/missing.png").await.unwrap();

        assert_eq!(asset, None);
        assert_eq!(store.mutation_count(), 0);
    }
}
