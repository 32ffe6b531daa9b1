//! Extração do CNPJ/CPF do titular a partir do subject do certificado
use const_oid::ObjectIdentifier;
use regex::Regex;
use std::sync::LazyLock;

use crate::certificate::{Certificate, SubjectAttribute};
use crate::error::{IngestionError, Result};

/// ICP-Brasil: CNPJ da pessoa jurídica titular
pub const OID_CNPJ: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.76.1.3.3");
/// ICP-Brasil: dados da pessoa física (nascimento + CPF + ...)
pub const OID_CPF: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.76.1.3.1");

const CNPJ_LEN: usize = 14;

static CNPJ_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\b\d{2}\.?\d{3}\.?\d{3}/?\d{4}-?\d{2}\b").expect("CNPJ regex"));
static CPF_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\b\d{3}\.?\d{3}\.?\d{3}-?\d{2}\b").expect("CPF regex"));

/// Tipo de documento esperado no certificado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxIdKind {
  Cnpj,
  Cpf,
}

impl TaxIdKind {
  pub fn label(self) -> &'static str {
    match self {
      Self::Cnpj => "CNPJ",
      Self::Cpf => "CPF",
    }
  }

  pub fn oid(self) -> ObjectIdentifier {
    match self {
      Self::Cnpj => OID_CNPJ,
      Self::Cpf => OID_CPF,
    }
  }

  fn pattern(self) -> &'static Regex {
    match self {
      Self::Cnpj => &CNPJ_RE,
      Self::Cpf => &CPF_RE,
    }
  }
}

/// Identidade declarada no certificado; existe só durante a validação
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectIdentity {
  /// Apenas dígitos
  pub tax_id: String,
  pub common_name: Option<String>,
}

/// Remove tudo que não for dígito
pub fn digits_only(value: &str) -> String {
  value.chars().filter(char::is_ascii_digit).collect()
}

pub fn extract(cert: &Certificate, kind: TaxIdKind) -> Result<SubjectIdentity> {
  let tax_id = extract_tax_id(cert.subject_attributes(), cert.subject_cn(), kind)
    .ok_or(IngestionError::NoIdentityFound(kind.label()))?;

  Ok(SubjectIdentity {
    tax_id,
    common_name: cert.subject_cn().map(str::to_string),
  })
}

/// Procura primeiro pelo OID do ICP-Brasil e, na falta dele, pelo número
/// formatado dentro do CN. Havendo mais de um atributo com o OID, vale o
/// primeiro na ordem do DER.
pub fn extract_tax_id(
  attributes: &[SubjectAttribute],
  common_name: Option<&str>,
  kind: TaxIdKind,
) -> Option<String> {
  let oid = kind.oid().to_string();

  let from_oid = attributes
    .iter()
    .filter(|attr| attr.oid == oid)
    .filter_map(|attr| attr.value.as_deref())
    .map(|value| normalize_oid_value(value, kind))
    .find(|digits| !digits.is_empty());

  if from_oid.is_some() {
    return from_oid;
  }

  let cn = common_name?;
  let found = kind.pattern().find(cn)?;
  let digits = digits_only(found.as_str());
  (!digits.is_empty()).then_some(digits)
}

fn normalize_oid_value(value: &str, kind: TaxIdKind) -> String {
  let digits = digits_only(value);
  match kind {
    // O valor pode vir prefixado (ex.: data de nascimento do responsável)
    TaxIdKind::Cnpj if digits.len() > CNPJ_LEN => digits[digits.len() - CNPJ_LEN..].to_string(),
    _ => digits,
  }
}
