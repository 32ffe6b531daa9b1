#![deny(clippy::all)]

mod certificate;
mod error;
mod expiry;
mod identity;
mod ingest;
mod ingestion_config;
mod inspect;
mod logging;
mod matcher;
mod pkcs12;
mod records;
mod storage;

#[cfg(test)]
mod testing;

// Os símbolos N-API só existem dentro do processo do Node
#[cfg(not(test))]
mod binding {
  use napi::bindgen_prelude::*;
  use napi_derive::napi;
  use tokio::sync::OnceCell;

  use crate::expiry::{self, ExpiryStatus};
  use crate::ingest::CertificateIngestor;
  use crate::ingestion_config::IngestionConfig;
  use crate::inspect;
  use crate::logging;
  use crate::matcher::Owner;
  use crate::records::{FirestoreConfig, FirestoreRecordStore};
  use crate::storage::{S3BlobStore, StorageConfig};

  type Ingestor = CertificateIngestor<S3BlobStore, FirestoreRecordStore>;

  // Uma instância por processo: a trava por titular só vale se for compartilhada
  static INGESTOR: OnceCell<Ingestor> = OnceCell::const_new();

  #[napi(object)]
  pub struct OwnerInfo {
    /// "empresa" ou "socio"
    pub kind: String,
    pub id: String,
    pub tax_id: String,
    pub name: String,
  }

  #[napi(object)]
  pub struct Config {
    pub companies_collection: Option<String>,
    pub partners_collection: Option<String>,
    pub valid_until_field: Option<String>,
    pub file_reference_field: Option<String>,
    pub storage_prefix: Option<String>,
    pub expiry_warning_days: Option<u32>,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub firestore_project_id: Option<String>,
    pub firestore_token: Option<String>,
    pub firestore_base_url: Option<String>,
  }

  #[napi(object)]
  pub struct IngestionResult {
    pub valid_until: String,
    pub file_reference: String,
    pub tax_id: String,
    pub common_name: Option<String>,
  }

  #[napi(object)]
  pub struct CertificateDetails {
    pub common_name: Option<String>,
    pub organization: Option<String>,
    pub valid_from: String,
    pub valid_until: String,
    pub serial_number: String,
    pub cnpj: Option<String>,
    pub cpf: Option<String>,
  }

  #[napi(object)]
  pub struct ExpiryInfo {
    /// "valid", "expiringSoon" ou "expired"
    pub status: String,
    /// Dias restantes (negativo quando vencido)
    pub days_left: i64,
  }

  fn owner_from(info: OwnerInfo) -> Result<Owner> {
    match info.kind.to_lowercase().as_str() {
      "empresa" | "company" => Ok(Owner::Company {
        id: info.id,
        cnpj: info.tax_id,
        name: info.name,
      }),
      "socio" | "sócio" | "partner" => Ok(Owner::Partner {
        id: info.id,
        cpf: info.tax_id,
        name: info.name,
      }),
      other => Err(Error::from_reason(format!(
        "[INVALID_OWNER] Tipo de titular desconhecido: {}",
        other
      ))),
    }
  }

  fn ingestion_config(cfg: &Option<Config>) -> IngestionConfig {
    let mut config = IngestionConfig::default();
    if let Some(cfg) = cfg {
      if let Some(ref value) = cfg.companies_collection {
        config.companies_collection = value.clone();
      }
      if let Some(ref value) = cfg.partners_collection {
        config.partners_collection = value.clone();
      }
      if let Some(ref value) = cfg.valid_until_field {
        config.valid_until_field = value.clone();
      }
      if let Some(ref value) = cfg.file_reference_field {
        config.file_reference_field = value.clone();
      }
      if let Some(ref value) = cfg.storage_prefix {
        config.storage_prefix = value.clone();
      }
      if let Some(days) = cfg.expiry_warning_days {
        config.expiry_warning_days = days;
      }
    }
    config
  }

  async fn build_ingestor(cfg: Option<Config>) -> Result<Ingestor> {
    let config = ingestion_config(&cfg);

    let storage_config = match cfg.as_ref().and_then(|c| c.bucket.clone()) {
      Some(bucket) => StorageConfig {
        bucket,
        region: cfg
          .as_ref()
          .and_then(|c| c.region.clone())
          .unwrap_or_else(|| "sa-east-1".to_string()),
        endpoint_url: cfg.as_ref().and_then(|c| c.endpoint_url.clone()),
      },
      None => StorageConfig::from_env()
        .map_err(|e| Error::from_reason(format!("Erro de configuração do armazenamento: {}", e)))?,
    };

    let firestore_config = match cfg.as_ref().and_then(|c| c.firestore_project_id.clone()) {
      Some(project_id) => FirestoreConfig {
        project_id,
        access_token: cfg.as_ref().and_then(|c| c.firestore_token.clone()),
        base_url: cfg
          .as_ref()
          .and_then(|c| c.firestore_base_url.clone())
          .unwrap_or_else(|| FirestoreConfig::DEFAULT_BASE_URL.to_string()),
      },
      None => FirestoreConfig::from_env()
        .map_err(|e| Error::from_reason(format!("Erro de configuração do banco: {}", e)))?,
    };

    let blobs = S3BlobStore::new(storage_config)
      .await
      .map_err(|e| Error::from_reason(format!("Erro de configuração do armazenamento: {}", e)))?;
    let records = FirestoreRecordStore::new(firestore_config)
      .map_err(|e| Error::from_reason(format!("Erro de configuração do banco: {}", e)))?;

    Ok(CertificateIngestor::new(blobs, records, config))
  }

  /// Instala os logs do addon (`RUST_LOG` tem precedência)
  #[napi]
  pub fn init_logging(filter: Option<String>) -> bool {
    logging::init(filter.as_deref())
  }

  /// Valida o PFX contra o cadastro do titular e grava validade + arquivo.
  ///
  /// A configuração só é lida na primeira chamada do processo.
  #[napi]
  pub async fn ingest_certificate(
    pfx: Buffer,
    password: String,
    owner: OwnerInfo,
    config: Option<Config>,
  ) -> Result<IngestionResult> {
    let owner = owner_from(owner)?;
    let pfx_data = pfx.to_vec();

    let ingestor = INGESTOR.get_or_try_init(|| build_ingestor(config)).await?;
    let receipt = ingestor.ingest(pfx_data, &password, &owner).await?;

    Ok(IngestionResult {
      valid_until: receipt.valid_until,
      file_reference: receipt.file_reference,
      tax_id: receipt.tax_id,
      common_name: receipt.common_name,
    })
  }

  /// Descreve o certificado sem conferir nem gravar nada
  #[napi]
  pub fn inspect_certificate(pfx: Buffer, password: String) -> Result<CertificateDetails> {
    let info = inspect::inspect(&pfx, &password)?;

    Ok(CertificateDetails {
      common_name: info.common_name,
      organization: info.organization,
      valid_from: info.valid_from,
      valid_until: info.valid_until,
      serial_number: info.serial_number,
      cnpj: info.cnpj,
      cpf: info.cpf,
    })
  }

  /// Situação de uma validade `YYYY-MM-DD` em relação a hoje
  #[napi]
  pub fn certificate_expiry_status(valid_until: String, warn_days: Option<u32>) -> Result<ExpiryInfo> {
    let date = expiry::parse_date(&valid_until)
      .ok_or_else(|| Error::from_reason(format!("Data inválida: {}", valid_until)))?;
    let warn_days = warn_days
      .or_else(|| INGESTOR.get().map(|i| i.config().expiry_warning_days))
      .unwrap_or(IngestionConfig::default().expiry_warning_days);
    // A validade gravada é o dia em UTC
    let today = chrono::Utc::now().date_naive();

    let (status, days_left) = match expiry::expiry_status(date, today, warn_days) {
      ExpiryStatus::Valid { days_left } => ("valid", days_left),
      ExpiryStatus::ExpiringSoon { days_left } => ("expiringSoon", days_left),
      ExpiryStatus::Expired { days_overdue } => ("expired", -days_overdue),
    };

    Ok(ExpiryInfo {
      status: status.to_string(),
      days_left,
    })
  }
}
