use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "kvql.pest"]
pub struct KvqlParser;
