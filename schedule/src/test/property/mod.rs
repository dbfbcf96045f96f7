//! Property-based tests for capacity, partitioning, boundary mapping and descriptor decoding.

mod capacity_props;
