pub mod demo_fixtures;
