pub mod corpus;
pub mod denylist;
pub mod fanout;
pub mod worker;
