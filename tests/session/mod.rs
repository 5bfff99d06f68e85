//! Gateway Session Tests
