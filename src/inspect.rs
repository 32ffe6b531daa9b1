use crate::certificate::format_date;
use crate::error::Result;
use crate::identity::{extract_tax_id, TaxIdKind};
use crate::pkcs12;

/// Informações do certificado
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
  pub common_name: Option<String>,
  pub organization: Option<String>,
  pub valid_from: String,
  pub valid_until: String,
  pub serial_number: String,
  pub cnpj: Option<String>,
  pub cpf: Option<String>,
}

/// Abre o PFX e descreve o certificado do titular, sem conferir nem gravar nada
pub fn inspect(pfx_data: &[u8], password: &str) -> Result<CertificateInfo> {
  let container = pkcs12::decode(pfx_data, password)?;
  let leaf = container.leaf()?;

  let lookup = |kind| extract_tax_id(leaf.subject_attributes(), leaf.subject_cn(), kind);
  let cnpj = lookup(TaxIdKind::Cnpj);
  let cpf = lookup(TaxIdKind::Cpf);

  Ok(CertificateInfo {
    common_name: leaf.subject_cn().map(str::to_string),
    organization: leaf.subject_org().map(str::to_string),
    valid_from: format_date(leaf.not_before().date_naive()),
    valid_until: leaf.valid_until_date(),
    serial_number: leaf.serial_number(),
    cnpj,
    cpf,
  })
}
