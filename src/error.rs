use thiserror::Error;

use crate::records::RecordError;
use crate::storage::StorageError;

/// Falhas de uma tentativa de ingestão de certificado.
///
/// Todas são terminais: nenhuma é repetida automaticamente e o usuário
/// precisa reenviar o arquivo. A mensagem (`Display`) é a que chega ao usuário.
#[derive(Error, Debug)]
pub enum IngestionError {
  #[error("Certificado inválido ou senha incorreta: {0}")]
  DecodeFailed(String),

  #[error("Nenhum certificado encontrado no arquivo PFX")]
  NoCertificateInContainer,

  #[error("Não foi possível identificar o {0} no certificado")]
  NoIdentityFound(&'static str),

  #[error("O certificado não pertence a este titular: {0}")]
  IdentityMismatch(String),

  #[error("Erro ao enviar o certificado para o armazenamento: {0}")]
  StorageUploadFailed(#[from] StorageError),

  #[error("Erro ao salvar a validade do certificado: {0}")]
  PersistFailed(#[from] RecordError),

  #[error("Titular inválido: {0}")]
  InvalidOwner(String),
}

impl IngestionError {
  /// Código estável para o lado JavaScript decidir a notificação.
  pub fn code(&self) -> &'static str {
    match self {
      Self::DecodeFailed(_) => "DECODE_FAILED",
      Self::NoCertificateInContainer => "NO_CERTIFICATE_IN_CONTAINER",
      Self::NoIdentityFound(_) => "NO_IDENTITY_FOUND",
      Self::IdentityMismatch(_) => "IDENTITY_MISMATCH",
      Self::StorageUploadFailed(_) => "STORAGE_UPLOAD_FAILED",
      Self::PersistFailed(_) => "PERSIST_FAILED",
      Self::InvalidOwner(_) => "INVALID_OWNER",
    }
  }
}

pub type Result<T> = std::result::Result<T, IngestionError>;

impl From<IngestionError> for napi::Error {
  fn from(err: IngestionError) -> Self {
    napi::Error::new(napi::Status::GenericFailure, format!("[{}] {}", err.code(), err))
  }
}
