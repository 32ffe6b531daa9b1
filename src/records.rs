//! Atualização parcial dos cadastros (empresas / sócios) no banco de documentos
use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
  #[error("cadastro não encontrado: {0}")]
  NotFound(String),

  #[error("erro de rede: {0}")]
  NetworkError(String),

  #[error("resposta inesperada do banco ({status}): {body}")]
  Rejected { status: u16, body: String },

  #[error("configuração inválida: {0}")]
  ConfigError(String),
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;

/// Banco de documentos onde ficam os cadastros.
///
/// `merge` grava apenas os campos informados; os demais campos do documento
/// permanecem intactos. O documento precisa existir.
#[async_trait]
pub trait RecordStore: Send + Sync {
  async fn merge(&self, collection: &str, id: &str, fields: &[(String, String)]) -> RecordResult<()>;
}

/// Configuração do acesso REST ao Firestore
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
  pub project_id: String,
  /// Token OAuth2 (Bearer). Ausente apenas contra o emulador.
  pub access_token: Option<String>,
  pub base_url: String,
}

impl FirestoreConfig {
  pub const DEFAULT_BASE_URL: &'static str = "https://firestore.googleapis.com/v1";

  pub fn from_env() -> RecordResult<Self> {
    let project_id = std::env::var("FIRESTORE_PROJECT_ID")
      .map_err(|_| RecordError::ConfigError("FIRESTORE_PROJECT_ID não definido".to_string()))?;

    Ok(Self {
      project_id,
      access_token: std::env::var("FIRESTORE_TOKEN").ok().filter(|t| !t.is_empty()),
      base_url: std::env::var("FIRESTORE_BASE_URL")
        .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string()),
    })
  }
}

pub struct FirestoreRecordStore {
  http: reqwest::Client,
  config: FirestoreConfig,
  base_url: Url,
}

impl FirestoreRecordStore {
  pub fn new(config: FirestoreConfig) -> RecordResult<Self> {
    if config.project_id.is_empty() {
      return Err(RecordError::ConfigError("project_id vazio".to_string()));
    }

    let base_url = Url::parse(&config.base_url)
      .map_err(|e| RecordError::ConfigError(format!("base_url inválida ({}): {}", config.base_url, e)))?;
    if base_url.cannot_be_a_base() {
      return Err(RecordError::ConfigError(format!("base_url inválida: {}", config.base_url)));
    }

    let http = reqwest::Client::builder()
      .timeout(std::time::Duration::from_secs(30))
      .build()
      .map_err(|e| RecordError::ConfigError(e.to_string()))?;

    Ok(Self {
      http,
      config,
      base_url,
    })
  }

  /// Cada parte entra como um segmento codificado: `#`, `?` e `%` no id não
  /// mudam o documento endereçado.
  fn document_url(&self, collection: &str, id: &str) -> RecordResult<Url> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| RecordError::ConfigError(format!("base_url inválida: {}", self.base_url)))?
      .pop_if_empty()
      .extend([
        "projects",
        self.config.project_id.as_str(),
        "databases",
        "(default)",
        "documents",
        collection,
        id,
      ]);
    Ok(url)
  }
}

/// Parâmetros de query: `updateMask` restringe a escrita aos campos enviados
/// e `currentDocument.exists` impede a criação de um cadastro novo.
fn merge_query(fields: &[(String, String)]) -> Vec<(&'static str, String)> {
  let mut query: Vec<(&'static str, String)> = fields
    .iter()
    .map(|(name, _)| ("updateMask.fieldPaths", name.clone()))
    .collect();
  query.push(("currentDocument.exists", "true".to_string()));
  query
}

fn merge_body(fields: &[(String, String)]) -> Value {
  let mut map = Map::new();
  for (name, value) in fields {
    map.insert(name.clone(), json!({ "stringValue": value }));
  }
  json!({ "fields": map })
}

#[async_trait]
impl RecordStore for FirestoreRecordStore {
  async fn merge(&self, collection: &str, id: &str, fields: &[(String, String)]) -> RecordResult<()> {
    let url = self.document_url(collection, id)?;

    let mut request = self
      .http
      .patch(url)
      .query(&merge_query(fields))
      .json(&merge_body(fields));
    if let Some(ref token) = self.config.access_token {
      request = request.bearer_auth(token);
    }

    let response = request
      .send()
      .await
      .map_err(|e| RecordError::NetworkError(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
      return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::NOT_FOUND {
      return Err(RecordError::NotFound(format!("{}/{}", collection, id)));
    }

    Err(RecordError::Rejected {
      status: status.as_u16(),
      body,
    })
  }
}
