//! Arena of originated loans.

use std::collections::BTreeMap;

use openlend_types::{constants, Loan, LoanId, OpenlendError, Result};

/// Loan table keyed by monotonically assigned [`LoanId`]. Records are
/// never deleted; terminal loans stay for audit.
#[derive(Debug)]
pub struct LoanTable {
    loans: BTreeMap<LoanId, Loan>,
    next_id: LoanId,
}

impl LoanTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            loans: BTreeMap::new(),
            next_id: LoanId(constants::FIRST_ID),
        }
    }

    /// Reserve the next loan id. The caller mints certificates against it
    /// and then inserts the finished record in the same operation.
    pub fn allocate(&mut self) -> LoanId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    /// Insert a newly originated loan under its allocated id.
    pub fn insert(&mut self, loan: Loan) {
        debug_assert!(
            !self.loans.contains_key(&loan.id),
            "loan id {} inserted twice",
            loan.id
        );
        self.loans.insert(loan.id, loan);
    }

    pub fn get(&self, id: LoanId) -> Result<&Loan> {
        self.loans.get(&id).ok_or(OpenlendError::LoanNotFound(id))
    }

    pub fn get_mut(&mut self, id: LoanId) -> Result<&mut Loan> {
        self.loans.get_mut(&id).ok_or(OpenlendError::LoanNotFound(id))
    }

    /// Iterate all loans (deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = &Loan> {
        self.loans.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.loans.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }
}

impl Default for LoanTable {
    fn default() -> Self {
        Self::new()
    }
}
