//! Certificate registry — mints and tracks loan ownership certificates.
//!
//! A thin stand-in for the external multi-holder certificate ledger. The
//! marketplace core only needs three facts from it: who holds a
//! certificate, that each (loan, role) certificate is minted exactly once,
//! and that transfers move the claim rights with the token.

use std::collections::BTreeMap;

use openlend_types::{
    constants, AccountId, Certificate, CertificateId, CertificateRole, LoanId, OpenlendError,
    Result,
};

/// Registry of minted certificates, keyed by monotonically assigned id.
#[derive(Debug)]
pub struct CertificateRegistry {
    certificates: BTreeMap<CertificateId, Certificate>,
    next_id: CertificateId,
}

impl CertificateRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            certificates: BTreeMap::new(),
            next_id: CertificateId(constants::FIRST_ID),
        }
    }

    /// Mint a certificate to `holder`. Called exactly once per (loan,
    /// role), at match time.
    pub fn mint(&mut self, holder: AccountId, loan: LoanId, role: CertificateRole) -> CertificateId {
        let id = self.next_id;
        self.next_id = id.next();
        self.certificates.insert(
            id,
            Certificate {
                id,
                loan,
                role,
                holder,
            },
        );
        tracing::info!(certificate = %id, loan = %loan, role = %role, holder = %holder, "Certificate minted");
        id
    }

    /// Current holder of a certificate.
    pub fn holder_of(&self, id: CertificateId) -> Result<AccountId> {
        self.certificates
            .get(&id)
            .map(|cert| cert.holder)
            .ok_or(OpenlendError::CertificateNotFound(id))
    }

    /// Whether `who` currently holds the certificate. Unknown ids hold for
    /// nobody.
    #[must_use]
    pub fn is_held_by(&self, id: CertificateId, who: AccountId) -> bool {
        self.certificates
            .get(&id)
            .is_some_and(|cert| cert.holder == who)
    }

    /// Transfer a certificate between accounts. Rights follow the holder.
    ///
    /// # Errors
    /// - `CertificateNotFound` for an unknown id
    /// - `NotCertificateHolder` unless `from` currently holds it
    pub fn transfer(&mut self, id: CertificateId, from: AccountId, to: AccountId) -> Result<()> {
        let cert = self
            .certificates
            .get_mut(&id)
            .ok_or(OpenlendError::CertificateNotFound(id))?;
        if cert.holder != from {
            return Err(OpenlendError::NotCertificateHolder(id));
        }
        cert.holder = to;
        tracing::info!(certificate = %id, from = %from, to = %to, "Certificate transferred");
        Ok(())
    }

    /// Look up a certificate record.
    #[must_use]
    pub fn get(&self, id: CertificateId) -> Option<&Certificate> {
        self.certificates.get(&id)
    }

    /// Number of certificates ever minted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }
}

impl Default for CertificateRegistry {
    fn default() -> Self {
        Self::new()
    }
}
