//! Offline helpers for dividend and tax bookkeeping: a scraper for Lynx/IBKR PDF reports and
//! a Yahoo Finance fetcher for dividend, price and profile data.

pub mod cli;
pub mod models;
pub mod services;
