pub mod turnover;
