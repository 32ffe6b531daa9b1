use crate::certificate::Certificate;
use crate::error::{IngestionError, Result};

/// Certificados extraídos de um contêiner PKCS#12
pub struct DecodedContainer {
  /// Certificado do titular seguido da cadeia (AC intermediária / raiz)
  pub certificates: Vec<Certificate>,
}

impl DecodedContainer {
  /// Certificado do titular
  pub fn leaf(&self) -> Result<&Certificate> {
    self
      .certificates
      .first()
      .ok_or(IngestionError::NoCertificateInContainer)
  }
}

/// Abre um PFX/P12 com a senha informada usando o openssl crate
pub fn decode(pfx_data: &[u8], password: &str) -> Result<DecodedContainer> {
  use openssl::pkcs12::Pkcs12;
  use openssl::provider::Provider;

  // Carrega o provider legado do OpenSSL 3.x para suportar algoritmos antigos
  // como RC2-40-CBC. `retain_fallbacks` mantém o provider padrão ativo depois
  // que este for descarregado.
  let _legacy = Provider::try_load(None, "legacy", true).ok();

  let pkcs12 = Pkcs12::from_der(pfx_data)
    .map_err(|e| IngestionError::DecodeFailed(format!("Erro ao parsear PKCS#12: {}", e)))?;

  // Senha errada e MAC inválido caem aqui
  let parsed = pkcs12.parse2(password).map_err(|e| {
    IngestionError::DecodeFailed(format!("Erro ao descriptografar PKCS#12: {}", e))
  })?;

  let mut cert_ders = Vec::new();
  if let Some(cert) = parsed.cert {
    let der = cert.to_der().map_err(|e| {
      IngestionError::DecodeFailed(format!("Erro ao exportar certificado: {}", e))
    })?;
    cert_ders.push(der);
  }

  if let Some(chain) = parsed.ca {
    for cert in chain {
      let der = cert.to_der().map_err(|e| {
        IngestionError::DecodeFailed(format!("Erro ao exportar certificado da cadeia: {}", e))
      })?;
      cert_ders.push(der);
    }
  }

  if cert_ders.is_empty() {
    return Err(IngestionError::NoCertificateInContainer);
  }

  let mut certificates = Vec::with_capacity(cert_ders.len());
  for (index, der) in cert_ders.iter().enumerate() {
    match Certificate::from_der(der) {
      Ok(cert) => certificates.push(cert),
      // O titular precisa ser legível; a cadeia é só informativa
      Err(e) if index == 0 => return Err(e),
      Err(e) => tracing::warn!(error = %e, index, "ignoring unreadable chain certificate"),
    }
  }

  Ok(DecodedContainer { certificates })
}
