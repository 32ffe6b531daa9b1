//! Conferência do certificado contra o cadastro do titular
use crate::error::{IngestionError, Result};
use crate::identity::{digits_only, SubjectIdentity, TaxIdKind};

/// Titular do certificado: empresa ou sócio
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
  Company { id: String, cnpj: String, name: String },
  Partner { id: String, cpf: String, name: String },
}

impl Owner {
  /// Id do documento do cadastro
  pub fn id(&self) -> &str {
    match self {
      Self::Company { id, .. } | Self::Partner { id, .. } => id,
    }
  }

  pub fn registered_tax_id(&self) -> &str {
    match self {
      Self::Company { cnpj, .. } => cnpj,
      Self::Partner { cpf, .. } => cpf,
    }
  }

  pub fn tax_id_kind(&self) -> TaxIdKind {
    match self {
      Self::Company { .. } => TaxIdKind::Cnpj,
      Self::Partner { .. } => TaxIdKind::Cpf,
    }
  }

  /// Segmento usado no caminho do arquivo e nos logs
  pub fn kind_slug(&self) -> &'static str {
    match self {
      Self::Company { .. } => "empresas",
      Self::Partner { .. } => "socios",
    }
  }
}

/// Confere a identidade extraída com o cadastro.
///
/// Empresa: CNPJ idêntico (só dígitos). Sócio: CPF idêntico ou contido um no
/// outro, e nome do CN igual ao cadastrado sem diferenciar maiúsculas. As duas
/// checagens do sócio são independentes e ambas obrigatórias.
pub fn verify(identity: &SubjectIdentity, owner: &Owner) -> Result<()> {
  let extracted = digits_only(&identity.tax_id);
  let expected = digits_only(owner.registered_tax_id());

  match owner {
    Owner::Company { name, .. } => {
      if extracted != expected {
        return Err(IngestionError::IdentityMismatch(format!(
          "CNPJ do certificado ({}) difere do CNPJ cadastrado para {} ({})",
          extracted, name, expected
        )));
      }
      Ok(())
    }
    Owner::Partner { name, .. } => {
      let mut failures = Vec::new();

      if !tax_ids_compatible(&extracted, &expected) {
        failures.push(format!(
          "CPF do certificado ({}) difere do CPF cadastrado ({})",
          extracted, expected
        ));
      }

      let certificate_name = identity.common_name.as_deref().map(holder_name);
      match certificate_name {
        Some(cn) if cn.to_lowercase() == name.trim().to_lowercase() => {}
        Some(cn) => failures.push(format!(
          "nome do certificado ({}) difere do nome cadastrado ({})",
          cn, name
        )),
        None => failures.push("certificado sem nome do titular (CN)".to_string()),
      }

      if failures.is_empty() {
        Ok(())
      } else {
        Err(IngestionError::IdentityMismatch(failures.join("; ")))
      }
    }
  }
}

/// Alguns emissores gravam o CPF junto de outros dados, por isso a
/// tolerância a substring. Nunca aplicada ao nome.
fn tax_ids_compatible(extracted: &str, expected: &str) -> bool {
  if extracted.is_empty() || expected.is_empty() {
    return false;
  }
  extracted == expected || extracted.contains(expected) || expected.contains(extracted)
}

/// Parte do CN antes do `:` (formato ICP-Brasil `NOME:CPF`)
fn holder_name(common_name: &str) -> &str {
  common_name.split(':').next().unwrap_or(common_name).trim()
}
