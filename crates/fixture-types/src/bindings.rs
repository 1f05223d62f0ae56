//! ABI bindings for the programs the fixture deploys and drives.
//!
//! Only the operations the orchestration layer touches are declared here;
//! the programs' business logic stays on chain.

use alloy::sol;

sol! {
	/// Central coordination program recording factories, modules and resources.
	#[sol(all_derives)]
	interface IRegistry {
		function initialize(
			address[] factories,
			address[] modules,
			address[] resources,
			uint256[] resourceIds
		) external;
		function isInitialized() external view returns (bool);
		function getFactories() external view returns (address[]);
		function getModules() external view returns (address[]);
		function resourceId(uint256 id) external view returns (address);
		function isToken(address token) external view returns (bool);
		function addToken(address token) external;
		function feeRecipient() external view returns (address);
	}

	/// Factory that creates and registers composite tokens.
	#[sol(all_derives)]
	interface ITokenFactory {
		function create(
			address[] components,
			int256[] units,
			address[] modules,
			address manager,
			string name,
			string symbol
		) external returns (address);

		/// Emitted once per created token; the only source of its address.
		event TokenCreated(address indexed token, address manager, string name, string symbol);
	}

	/// Composite token holding a list of component positions.
	#[sol(all_derives)]
	interface ICompositeToken {
		struct Position {
			address component;
			address module;
			int256 unit;
			uint8 positionState;
			bytes data;
		}

		function getPositions() external view returns (Position[]);
		function getComponents() external view returns (address[]);
		function balanceOf(address account) external view returns (uint256);
		function totalSupply() external view returns (uint256);
		function manager() external view returns (address);
		function mint(address account, uint256 quantity) external;
	}

	/// Module that issues composite tokens against their components.
	#[sol(all_derives)]
	interface IIssuanceModule {
		function initialize(address token, address preIssueHook) external;
		function issue(address token, uint256 quantity, address to) external;
	}

	/// Fungible token mock.
	#[sol(all_derives)]
	interface ITokenMock {
		function approve(address spender, uint256 amount) external returns (bool);
		function allowance(address owner, address spender) external view returns (uint256);
		function balanceOf(address account) external view returns (uint256);
		function transfer(address to, uint256 amount) external returns (bool);
		function transferFrom(address from, address to, uint256 amount) external returns (bool);
		function decimals() external view returns (uint8);

		event Transfer(address indexed from, address indexed to, uint256 value);
		event Approval(address indexed owner, address indexed spender, uint256 value);
	}

	/// Fixed-price feed mock.
	#[sol(all_derives)]
	interface IOracleMock {
		function read() external view returns (uint256);
	}

	#[sol(all_derives)]
	interface IPriceOracle {
		function getPrice(address assetOne, address assetTwo) external view returns (uint256);
		function masterQuoteAsset() external view returns (address);
	}
}
