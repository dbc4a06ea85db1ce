pub mod booking;
pub mod criteria;
pub mod envelope;
pub mod inventory;
pub mod reference;
