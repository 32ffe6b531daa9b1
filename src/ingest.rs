use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

use crate::error::{IngestionError, Result};
use crate::identity;
use crate::ingestion_config::IngestionConfig;
use crate::matcher::{self, Owner};
use crate::pkcs12;
use crate::records::RecordStore;
use crate::storage::BlobStore;

const PFX_CONTENT_TYPE: &str = "application/x-pkcs12";
const MAX_OWNER_ID_LEN: usize = 1500;

/// Etapas da ingestão, na ordem em que são executadas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Decoding,
  IdentityExtraction,
  IdentityMatching,
  ExpiryExtraction,
  Uploading,
  Persisting,
}

/// Resultado de uma ingestão bem-sucedida
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionReceipt {
  /// `YYYY-MM-DD`
  pub valid_until: String,
  pub file_reference: String,
  pub tax_id: String,
  pub common_name: Option<String>,
}

/// Orquestra decodificação, conferência do titular, envio do arquivo e
/// atualização do cadastro. Nada é gravado no cadastro se qualquer etapa
/// anterior falhar.
pub struct CertificateIngestor<B, R> {
  blobs: B,
  records: R,
  config: IngestionConfig,
  in_flight: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl<B: BlobStore, R: RecordStore> CertificateIngestor<B, R> {
  pub fn new(blobs: B, records: R, config: IngestionConfig) -> Self {
    Self {
      blobs,
      records,
      config,
      in_flight: Mutex::new(HashMap::new()),
    }
  }

  pub fn config(&self) -> &IngestionConfig {
    &self.config
  }

  /// Chave do arquivo no armazenamento: titular + hash do conteúdo. O mesmo
  /// arquivo sempre cai na mesma chave e um envio novo nunca sobrescreve o
  /// arquivo ainda referenciado pelo cadastro.
  pub fn storage_key(&self, owner: &Owner, pfx_data: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(pfx_data));
    format!(
      "{}/{}/{}/{}.pfx",
      self.config.storage_prefix.trim_end_matches('/'),
      owner.kind_slug(),
      owner.id(),
      &digest[..16]
    )
  }

  fn collection(&self, owner: &Owner) -> &str {
    match owner {
      Owner::Company { .. } => &self.config.companies_collection,
      Owner::Partner { .. } => &self.config.partners_collection,
    }
  }

  /// Trava por titular: ingestões do mesmo titular rodam uma de cada vez
  fn owner_lock(&self, owner: &Owner) -> Arc<AsyncMutex<()>> {
    let mut locks = self
      .in_flight
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    // Descarta travas que ninguém mais segura
    locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    locks
      .entry(format!("{}/{}", owner.kind_slug(), owner.id()))
      .or_default()
      .clone()
  }

  pub async fn ingest(
    &self,
    pfx_data: Vec<u8>,
    password: &str,
    owner: &Owner,
  ) -> Result<IngestionReceipt> {
    validate_owner(owner)?;

    let lock = self.owner_lock(owner);
    let _guard = lock.lock().await;

    let result = self.run(pfx_data, password, owner).await;
    match result {
      Ok(ref receipt) => tracing::info!(
        owner_id = %owner.id(),
        owner_kind = owner.kind_slug(),
        valid_until = %receipt.valid_until,
        "certificate ingested"
      ),
      Err(ref e) => tracing::warn!(
        owner_id = %owner.id(),
        owner_kind = owner.kind_slug(),
        code = e.code(),
        error = %e,
        "certificate ingestion failed"
      ),
    }
    result
  }

  async fn run(&self, pfx_data: Vec<u8>, password: &str, owner: &Owner) -> Result<IngestionReceipt> {
    let owner_id = owner.id();

    enter(Stage::Decoding, owner_id);
    let container = pkcs12::decode(&pfx_data, password)?;
    let leaf = container.leaf()?;

    enter(Stage::IdentityExtraction, owner_id);
    let identity = identity::extract(leaf, owner.tax_id_kind())?;

    enter(Stage::IdentityMatching, owner_id);
    matcher::verify(&identity, owner)?;

    enter(Stage::ExpiryExtraction, owner_id);
    let valid_until = leaf.valid_until_date();

    enter(Stage::Uploading, owner_id);
    let key = self.storage_key(owner, &pfx_data);
    let file_reference = self
      .blobs
      .put(&key, pfx_data, PFX_CONTENT_TYPE)
      .await
      .map_err(|e| {
        tracing::error!(error = %e, key = %key, "certificate upload failed");
        IngestionError::StorageUploadFailed(e)
      })?;

    enter(Stage::Persisting, owner_id);
    let fields = [
      (self.config.valid_until_field.clone(), valid_until.clone()),
      (self.config.file_reference_field.clone(), file_reference.clone()),
    ];
    self
      .records
      .merge(self.collection(owner), owner_id, &fields)
      .await
      .map_err(|e| {
        tracing::error!(error = %e, owner_id = %owner_id, "certificate record update failed");
        IngestionError::PersistFailed(e)
      })?;

    Ok(IngestionReceipt {
      valid_until,
      file_reference,
      tax_id: identity.tax_id,
      common_name: identity.common_name,
    })
  }
}

fn enter(stage: Stage, owner_id: &str) {
  tracing::debug!(stage = ?stage, owner_id = %owner_id, "ingestion stage");
}

/// O id vira segmento de caminho no armazenamento e no banco e precisa caber
/// nos dois sem escape: letras e dígitos ASCII, `-`, `_` e `.`. O Firestore
/// reserva `.`, `..` e ids no formato `__x__`.
fn validate_owner(owner: &Owner) -> Result<()> {
  let id = owner.id();
  if id.trim().is_empty() {
    return Err(IngestionError::InvalidOwner("id do cadastro vazio".to_string()));
  }

  let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
  let reserved = id == "." || id == ".." || (id.len() >= 4 && id.starts_with("__") && id.ends_with("__"));
  if reserved || !id.chars().all(allowed) || id.len() > MAX_OWNER_ID_LEN {
    return Err(IngestionError::InvalidOwner(format!("id do cadastro inválido: {}", id)));
  }
  Ok(())
}
