/// Configuração da ingestão de certificados
#[derive(Debug, Clone)]
pub struct IngestionConfig {
  /// Coleção dos cadastros de empresas
  pub companies_collection: String,
  /// Coleção dos cadastros de sócios
  pub partners_collection: String,
  /// Campo do cadastro que recebe a validade (`YYYY-MM-DD`)
  pub valid_until_field: String,
  /// Campo do cadastro que recebe a referência do arquivo
  pub file_reference_field: String,
  /// Prefixo dos arquivos no armazenamento
  pub storage_prefix: String,
  /// Dias antes do vencimento em que o certificado passa a gerar alerta
  pub expiry_warning_days: u32,
}

impl Default for IngestionConfig {
  fn default() -> Self {
    Self {
      companies_collection: "empresas".to_string(),
      partners_collection: "socios".to_string(),
      valid_until_field: "certificateValidUntil".to_string(),
      file_reference_field: "certificateFileReference".to_string(),
      storage_prefix: "certificados".to_string(),
      expiry_warning_days: 30,
    }
  }
}
