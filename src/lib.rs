/*
    An LL(1) compiler front end: FIRST/FOLLOW sets, parse tables, a
    table-driven parser producing syntax trees, and a scope analyzer for a
    small typed language
*/

pub mod error_handling;
pub mod generator;
pub mod grammar;
pub mod lang;
pub mod loader;
pub mod parser;
pub mod semantic;
pub mod sets;
pub mod table;
pub mod token;
