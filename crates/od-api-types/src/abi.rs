//! Contract surfaces the record core talks to.
//!
//! The L2 record store is keyed by DNS-encoded names; the L1 registry and
//! resolvers it migrates from are keyed by namehash.

use alloy_sol_types::sol;

sol! {
    /// L2 record store. Every accessor takes the DNS wire-format name first.
    interface IRecordResolver {
        function addr(bytes dnsEncoded, uint256 coinType) external view returns (bytes);
        function text(bytes dnsEncoded, string key) external view returns (string);
        function contenthash(bytes dnsEncoded) external view returns (bytes);
        function data(bytes dnsEncoded, string key) external view returns (bytes);

        function setAddr(bytes dnsEncoded, uint256 coinType, bytes addr) external;
        function setText(bytes dnsEncoded, string key, string value) external;
        function setContenthash(bytes dnsEncoded, bytes hash) external;
        function setData(bytes dnsEncoded, string key, bytes value) external;
    }

    /// Call aggregator exposed by both resolvers.
    interface IMulticall {
        function multicall(bytes[] data) external returns (bytes[] results);
    }

    interface IL1Resolver {
        function addr(bytes32 node, uint256 coinType) external view returns (bytes);
        function text(bytes32 node, string key) external view returns (string);
        function contenthash(bytes32 node) external view returns (bytes);
        function data(bytes32 node, string key) external view returns (bytes);
    }

    interface IRegistry {
        function resolver(bytes32 node) external view returns (address);
        function owner(bytes32 node) external view returns (address);
        function setResolver(bytes32 node, address resolver) external;
    }

    interface INameWrapper {
        function setResolver(bytes32 node, address resolver) external;
    }

    /// Parent domain contract that hands out sub-names on L2.
    interface IParentDomain {
        function resolver() external view returns (address);
        function subdomains(string label) external view returns (address);
        function getSubdomainNames() external view returns (string[]);
    }
}
