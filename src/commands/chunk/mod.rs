mod extract;
mod run;
mod source_map;
#[cfg(test)]
mod tests;

pub use run::run;
