pub mod conns;
