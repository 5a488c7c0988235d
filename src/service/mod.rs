//! Service layer: each public operation is one transaction, composed from the
//! inventory ledger, the status transition table and the settlement gateway.

pub mod orders;
