pub mod cumsum;
