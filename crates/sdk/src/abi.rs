//! `WavePortal` contract interface.

alloy::sol! {
    #[sol(rpc)]
    contract WavePortal {
        #[derive(Debug, PartialEq, Eq)]
        struct Wave {
            address waver;
            string message;
            uint256 timestamp;
        }

        #[derive(Debug, PartialEq, Eq)]
        event NewWave(address from, string message, uint256 timestamp);

        function getTotalWaves() external view returns (uint256);

        function getAllWaves() external view returns (Wave[] memory);

        function wave(string memory _message) external;
    }
}
