pub mod leave;
pub mod notification;

#[cfg(test)]
mod tests;
