pub mod consumers;
pub mod establishments;
pub mod offers;
