// fn main not required; everything in tests/api is bundled into a single test
// binary, so linking happens once.
mod health_check;
mod helpers;
