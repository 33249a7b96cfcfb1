// HTTP side: request interception, response synthesis and the local server.

pub mod compat;
pub mod descriptor;
pub mod handler;
pub mod intercept;
pub mod synth;
