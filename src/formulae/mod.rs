//! Abstract syntax trees for STREL formulae and functionality for their manipulation.
//!
//! Formulae are built through the `mk_*` constructors of
//! [strel_tree::StrelTreeNode]; the constructor computes a canonical string
//! for every node, and that string is the identity used by the compiler to
//! recognize shared subformulae.

pub mod operator_enums;
pub mod strel_tree;
