pub mod events;
pub mod export;
pub mod health;
pub mod runs;
pub mod test_run;
