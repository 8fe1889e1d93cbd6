pub mod account;
pub mod approval;
pub mod audit;
pub mod dashboard;
pub mod decision;
pub mod ledger;
pub mod management;
pub mod session;
pub mod status_change;
pub mod sweeper;
pub mod threshold;
