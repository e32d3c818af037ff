mod client;
mod io;

pub use client::Agent;
pub use io::stdin_lines;
