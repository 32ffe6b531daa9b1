use chrono::{DateTime, NaiveDate, Utc};
use der_parser::asn1_rs::FromDer;
use x509_parser::prelude::X509Certificate;

use crate::error::{IngestionError, Result};

/// Atributo do subject na ordem em que aparece no DER
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectAttribute {
  /// OID em notação pontuada, ex.: `2.16.76.1.3.3`
  pub oid: String,
  /// Valor textual; `None` quando o atributo não é uma string ASN.1
  pub value: Option<String>,
}

/// Certificado X.509 já decodificado, com os dados que a ingestão usa
#[derive(Debug, Clone)]
pub struct Certificate {
  subject: Vec<SubjectAttribute>,
  common_name: Option<String>,
  organization: Option<String>,
  not_before: DateTime<Utc>,
  not_after: DateTime<Utc>,
  serial: Vec<u8>,
}

impl Certificate {
  pub fn from_der(der: &[u8]) -> Result<Self> {
    let (_, parsed) = X509Certificate::from_der(der).map_err(|e| {
      IngestionError::DecodeFailed(format!("Erro ao parsear certificado: {:?}", e))
    })?;

    let subject: Vec<SubjectAttribute> = parsed
      .subject()
      .iter_attributes()
      .map(|attr| SubjectAttribute {
        oid: attr.attr_type().to_id_string(),
        value: attr.as_str().ok().map(str::to_string),
      })
      .collect();

    let common_name = parsed
      .subject()
      .iter_common_name()
      .find_map(|cn| cn.as_str().ok())
      .map(str::to_string);

    let organization = parsed
      .subject()
      .iter_organization()
      .find_map(|o| o.as_str().ok())
      .map(str::to_string);

    let validity = parsed.validity();
    let not_before = to_utc(validity.not_before.timestamp())?;
    let not_after = to_utc(validity.not_after.timestamp())?;

    Ok(Self {
      subject,
      common_name,
      organization,
      not_before,
      not_after,
      serial: parsed.serial.to_bytes_be(),
    })
  }

  pub fn subject_attributes(&self) -> &[SubjectAttribute] {
    &self.subject
  }

  pub fn subject_cn(&self) -> Option<&str> {
    self.common_name.as_deref()
  }

  pub fn subject_org(&self) -> Option<&str> {
    self.organization.as_deref()
  }

  pub fn not_before(&self) -> DateTime<Utc> {
    self.not_before
  }

  /// Data de validade (notAfter em UTC, truncado ao dia)
  pub fn valid_until(&self) -> NaiveDate {
    self.not_after.date_naive()
  }

  /// Validade no formato gravado no cadastro: `YYYY-MM-DD`
  pub fn valid_until_date(&self) -> String {
    format_date(self.valid_until())
  }

  pub fn serial_number(&self) -> String {
    hex::encode(self.serial.as_slice())
  }
}

pub fn format_date(date: NaiveDate) -> String {
  date.format("%Y-%m-%d").to_string()
}

fn to_utc(timestamp: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp(timestamp, 0).ok_or_else(|| {
    IngestionError::DecodeFailed(format!("Data de validade fora do intervalo: {}", timestamp))
  })
}
