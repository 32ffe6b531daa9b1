//! Fixtures de teste: certificados e PFX gerados com OpenSSL e armazenamentos em memória
use async_trait::async_trait;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::x509::{X509Builder, X509NameBuilder, X509};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::records::{RecordError, RecordResult, RecordStore};
use crate::storage::{BlobStore, StorageError, StorageResult};

/// Descrição de um certificado autoassinado para os testes
pub struct CertSpec {
  common_name: Option<String>,
  organization: Option<String>,
  attrs: Vec<(String, String)>,
  not_before: i64,
  not_after: i64,
  serial: u32,
}

impl CertSpec {
  pub fn new(common_name: &str) -> Self {
    Self {
      common_name: Some(common_name.to_string()),
      organization: None,
      attrs: Vec::new(),
      // 2025-01-01 .. 2027-03-01 12:00 UTC
      not_before: 1_735_689_600,
      not_after: 1_803_902_400,
      serial: 1,
    }
  }

  pub fn without_common_name(mut self) -> Self {
    self.common_name = None;
    self
  }

  pub fn with_attr(mut self, oid: &str, value: &str) -> Self {
    self.attrs.push((oid.to_string(), value.to_string()));
    self
  }

  pub fn organization(mut self, value: &str) -> Self {
    self.organization = Some(value.to_string());
    self
  }

  pub fn not_after_unix(mut self, timestamp: i64) -> Self {
    self.not_after = timestamp;
    self
  }

  pub fn serial(mut self, serial: u32) -> Self {
    self.serial = serial;
    self
  }

  fn key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
  }

  fn build(&self, key: &PKey<Private>) -> X509 {
    let mut name = X509NameBuilder::new().unwrap();
    if let Some(ref cn) = self.common_name {
      name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    }
    if let Some(ref org) = self.organization {
      name.append_entry_by_nid(Nid::ORGANIZATIONNAME, org).unwrap();
    }
    for (oid, value) in &self.attrs {
      name.append_entry_by_text(oid, value).unwrap();
    }
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(self.serial).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(key).unwrap();
    builder
      .set_not_before(&Asn1Time::from_unix(self.not_before).unwrap())
      .unwrap();
    builder
      .set_not_after(&Asn1Time::from_unix(self.not_after).unwrap())
      .unwrap();
    builder.sign(key, MessageDigest::sha256()).unwrap();
    builder.build()
  }

  pub fn cert_der(&self) -> Vec<u8> {
    self.build(&Self::key()).to_der().unwrap()
  }

  pub fn pfx(&self, password: &str) -> Vec<u8> {
    let key = Self::key();
    let cert = self.build(&key);
    Pkcs12::builder()
      .name("certificado")
      .pkey(&key)
      .cert(&cert)
      .build2(password)
      .unwrap()
      .to_der()
      .unwrap()
  }

  /// Contêiner apenas com a chave privada
  pub fn key_only_pfx(&self, password: &str) -> Vec<u8> {
    let key = Self::key();
    Pkcs12::builder()
      .name("chave")
      .pkey(&key)
      .build2(password)
      .unwrap()
      .to_der()
      .unwrap()
  }
}

#[derive(Default)]
pub struct MemoryBlobStore {
  pub objects: Mutex<HashMap<String, Vec<u8>>>,
  pub fail: AtomicBool,
  pub puts: AtomicUsize,
  /// Maior número de `put` simultâneos observado
  pub max_in_flight: AtomicUsize,
  in_flight: AtomicUsize,
  delay: Option<Duration>,
}

impl MemoryBlobStore {
  /// Cada `put` leva `delay` para terminar
  pub fn with_delay(delay: Duration) -> Self {
    Self {
      delay: Some(delay),
      ..Self::default()
    }
  }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
  async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> StorageResult<String> {
    self.puts.fetch_add(1, Ordering::SeqCst);
    let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_in_flight.fetch_max(running, Ordering::SeqCst);
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
    self.in_flight.fetch_sub(1, Ordering::SeqCst);

    if self.fail.load(Ordering::SeqCst) {
      return Err(StorageError::UploadFailed("bucket indisponível".to_string()));
    }
    self.objects.lock().unwrap().insert(key.to_string(), data);
    Ok(format!("memory://{}", key))
  }
}

/// Banco de documentos em memória com semântica de merge
#[derive(Default)]
pub struct MemoryRecordStore {
  pub documents: Mutex<HashMap<(String, String), HashMap<String, String>>>,
  pub fail: AtomicBool,
}

impl MemoryRecordStore {
  pub fn with_document(collection: &str, id: &str, fields: &[(&str, &str)]) -> Self {
    let store = Self::default();
    store.documents.lock().unwrap().insert(
      (collection.to_string(), id.to_string()),
      fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
    );
    store
  }

  pub fn field(&self, collection: &str, id: &str, field: &str) -> Option<String> {
    self
      .documents
      .lock()
      .unwrap()
      .get(&(collection.to_string(), id.to_string()))
      .and_then(|doc| doc.get(field).cloned())
  }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
  async fn merge(&self, collection: &str, id: &str, fields: &[(String, String)]) -> RecordResult<()> {
    if self.fail.load(Ordering::SeqCst) {
      return Err(RecordError::NetworkError("timeout".to_string()));
    }
    let mut documents = self.documents.lock().unwrap();
    let doc = documents
      .get_mut(&(collection.to_string(), id.to_string()))
      .ok_or_else(|| RecordError::NotFound(format!("{}/{}", collection, id)))?;
    for (name, value) in fields {
      doc.insert(name.clone(), value.clone());
    }
    Ok(())
  }
}
