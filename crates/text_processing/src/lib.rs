//! Text processing for the fraud honeypot
//!
//! This crate provides the stateless analysis stages of a turn:
//! - **Entity Extraction**: phone numbers, bank accounts, payment handles,
//!   links, emails and case/policy/order references
//! - **Fraud Classification**: weighted keyword scoring with urgency signals
//!
//! # Example
//!
//! ```ignore
//! use honeypot_text_processing::{EntityExtractor, FraudClassifier};
//!
//! let text = "URGENT: account 1234567890123456 blocked, call +91-9876543210";
//! let evidence = EntityExtractor::new().extract_all(text);
//! let result = FraudClassifier::new().classify(text, std::iter::empty());
//! ```

pub mod classifier;
pub mod entities;

pub use classifier::FraudClassifier;
pub use entities::EntityExtractor;
