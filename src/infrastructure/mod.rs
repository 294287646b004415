pub mod lnd_rest;
pub mod lnurl;
