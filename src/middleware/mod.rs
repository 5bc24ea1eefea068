pub mod in_flight;
