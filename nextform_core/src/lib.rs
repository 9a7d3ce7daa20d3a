pub mod form;
pub mod submitter;
pub mod view;

#[cfg(test)]
mod tests;
