pub mod client_ip;
mod geo_filter;

pub use client_ip::{
    ClientIpError, ClientIpStrategy, LeftmostNonPrivate, RemoteAddr, RightmostNonPrivate,
    RightmostTrustedCount, SingleIpHeader,
};
pub use geo_filter::{
    filter_ip, with_geo_filter, BlockHandler, DefaultBlockResponse, IpFilter, IpFilterOptions,
    PathPrefixFilter, RequestFilter,
};
