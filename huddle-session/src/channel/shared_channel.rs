use async_trait::async_trait;
use huddle_core::ChannelError;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Key/value store both parties read and write. The only transport between
/// host and participant.
///
/// No ordering across keys and no access control: anything written here is
/// visible to every party sharing the store.
#[async_trait]
pub trait SharedChannel: Send + Sync {
    async fn write(&self, key: &str, value: String) -> Result<(), ChannelError>;

    async fn read(&self, key: &str) -> Result<Option<String>, ChannelError>;

    async fn delete(&self, key: &str) -> Result<(), ChannelError>;
}

/// JSON helpers over any [`SharedChannel`].
#[async_trait]
pub trait SharedChannelExt {
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ChannelError>;

    async fn write_json<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), ChannelError>;
}

#[async_trait]
impl<C: SharedChannel + ?Sized> SharedChannelExt for C {
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ChannelError> {
        let Some(raw) = self.read(key).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn write_json<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), ChannelError> {
        let json = serde_json::to_string(value)?;
        self.write(key, json).await
    }
}
