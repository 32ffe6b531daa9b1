//! Armazenamento do arquivo PFX original
use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
  #[error("falha no envio: {0}")]
  UploadFailed(String),

  #[error("configuração inválida: {0}")]
  ConfigError(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Destino durável para o arquivo bruto do certificado.
///
/// `put` grava os bytes na chave indicada (sobrescrevendo o que houver) e
/// devolve uma referência recuperável para o objeto.
#[async_trait]
pub trait BlobStore: Send + Sync {
  async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<String>;
}

/// Configuração do bucket S3 (ou compatível)
#[derive(Debug, Clone)]
pub struct StorageConfig {
  pub bucket: String,
  pub region: String,
  /// Endpoint customizado para provedores compatíveis com S3 (MinIO, R2...)
  pub endpoint_url: Option<String>,
}

impl StorageConfig {
  pub fn from_env() -> StorageResult<Self> {
    let bucket = std::env::var("CERT_S3_BUCKET")
      .map_err(|_| StorageError::ConfigError("CERT_S3_BUCKET não definido".to_string()))?;
    let region = std::env::var("CERT_S3_REGION").unwrap_or_else(|_| "sa-east-1".to_string());
    let endpoint_url = std::env::var("CERT_S3_ENDPOINT").ok().filter(|e| !e.is_empty());

    Ok(Self {
      bucket,
      region,
      endpoint_url,
    })
  }
}

#[derive(Clone)]
pub struct S3BlobStore {
  client: Client,
  config: StorageConfig,
}

impl S3BlobStore {
  pub async fn new(config: StorageConfig) -> StorageResult<Self> {
    if config.bucket.is_empty() {
      return Err(StorageError::ConfigError("bucket vazio".to_string()));
    }

    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
      .region(Region::new(config.region.clone()));
    if let Some(ref endpoint) = config.endpoint_url {
      loader = loader.endpoint_url(endpoint.clone());
    }
    let shared = loader.load().await;

    // Provedores compatíveis costumam exigir path-style
    let s3_config = aws_sdk_s3::config::Builder::from(&shared)
      .force_path_style(config.endpoint_url.is_some())
      .build();

    Ok(Self {
      client: Client::from_conf(s3_config),
      config,
    })
  }

  /// URL pública do objeto
  pub fn object_url(&self, key: &str) -> String {
    object_url(&self.config, key)
  }
}

fn object_url(config: &StorageConfig, key: &str) -> String {
  match config.endpoint_url {
    Some(ref endpoint) => format!(
      "{}/{}/{}",
      endpoint.trim_end_matches('/'),
      config.bucket,
      key
    ),
    None => format!(
      "https://{}.s3.{}.amazonaws.com/{}",
      config.bucket, config.region, key
    ),
  }
}

#[async_trait]
impl BlobStore for S3BlobStore {
  async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<String> {
    let size = data.len();

    self
      .client
      .put_object()
      .bucket(&self.config.bucket)
      .key(key)
      .content_type(content_type)
      .body(ByteStream::from(data))
      .send()
      .await
      .map_err(|e| {
        tracing::error!(
          error = ?e,
          bucket = %self.config.bucket,
          key = %key,
          size_bytes = size,
          "S3 upload failed"
        );
        StorageError::UploadFailed(e.to_string())
      })?;

    tracing::debug!(bucket = %self.config.bucket, key = %key, size_bytes = size, "S3 upload ok");

    Ok(self.object_url(key))
  }
}
