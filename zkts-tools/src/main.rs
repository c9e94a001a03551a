use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zkts_common::{hash_by_bytes, Address, Amount, StampHash, StampProof, Timestamp, VerifierRef};
use zkts_registry::{
    AccountBook, CallContext, CreateStampRequest, EventLog, MemoryStore, RegistryConfig,
    StampError, StampInfo, StampRegistry, DEFAULT_PAGE_LIMIT,
};
use zkts_verifier::mock::{MockKey, MockProver, MockVerifier};
use zkts_verifier::StaticDirectory;

const DEFAULT_STATE_PATH: &str = "zkts-state.json";
const DEFAULT_KEY_SEED: &str = "zkts-dev";
const DEFAULT_LOG_FILTER: &str = "info,zkts_registry=debug";

#[derive(Parser)]
#[command(
    name = "zkts",
    about = "Proof-gated timestamp attestation registry, run against a local state file"
)]
struct Cli {
    /// Registry state file (store, event log and account balances).
    #[arg(long, global = true, default_value = DEFAULT_STATE_PATH)]
    state: PathBuf,
    /// Seed of the mock proving key shared by `prove` and the verifier.
    #[arg(long, global = true, default_value = DEFAULT_KEY_SEED)]
    key_seed: String,
    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One-shot registry initialization.
    Init(InitArgs),
    /// Print the commitment of some content.
    Hash(ContentArgs),
    /// Produce a mock proof of knowledge of content, bound to a caller.
    Prove(ProveArgs),
    /// Print the verifier reference of the mock key.
    VerifierRef,
    /// Register a new stamp.
    Create(CreateArgs),
    /// Sign an existing stamp.
    Sign(SignArgs),
    /// Show a stamp and its signers.
    Info(InfoArgs),
    /// Show one identity's record on a stamp.
    User(UserArgs),
    /// List the stamps an identity can act on.
    Hashes(HashesArgs),
    /// Number of signer records of a stamp.
    SignersCount(HashArgs),
    /// Change the creation fee (owner only).
    SetFee(SetFeeArgs),
    /// Point proof checks at another verifier (owner only).
    SetVerifier(SetVerifierArgs),
    /// Send the accumulated fees to an account (owner only).
    Withdraw(WithdrawArgs),
    /// Hand the registry to a new owner (owner only).
    TransferOwnership(TransferOwnershipArgs),
    /// Fund an account that pays for stamps.
    Deposit(DepositArgs),
    /// Spendable balance of an account.
    Balance(BalanceArgs),
    /// Print committed events.
    Events(EventsArgs),
}

#[derive(Args)]
struct CallArgs {
    /// Calling identity.
    #[arg(long)]
    caller: Address,
    /// Call timestamp in seconds; defaults to now.
    #[arg(long)]
    at: Option<Timestamp>,
}

impl CallArgs {
    fn context(&self) -> CallContext {
        CallContext::new(self.caller, self.at.unwrap_or_else(current_unix_timestamp))
    }
}

#[derive(Args)]
struct ContentArgs {
    /// Read content from a file.
    #[arg(long, conflicts_with = "text")]
    file: Option<PathBuf>,
    /// Use a literal string as content.
    #[arg(long)]
    text: Option<String>,
}

impl ContentArgs {
    fn is_given(&self) -> bool {
        self.file.is_some() || self.text.is_some()
    }

    fn read(&self) -> Result<Vec<u8>> {
        match (&self.file, &self.text) {
            (Some(path), _) => {
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))
            }
            (None, Some(text)) => Ok(text.clone().into_bytes()),
            (None, None) => bail!("either --file or --text is required"),
        }
    }
}

#[derive(Args)]
struct InitArgs {
    #[command(flatten)]
    call: CallArgs,
    /// JSON config file; environment variables are used otherwise.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    fee: Option<Amount>,
    /// Defaults to the mock key's verifier.
    #[arg(long)]
    verifier: Option<VerifierRef>,
    /// Defaults to the caller.
    #[arg(long)]
    owner: Option<Address>,
}

#[derive(Args)]
struct ProveArgs {
    #[command(flatten)]
    content: ContentArgs,
    /// Identity the proof is bound to.
    #[arg(long)]
    caller: Address,
    /// Write the proof JSON to this file.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct CreateArgs {
    #[command(flatten)]
    call: CallArgs,
    /// Prove the content inline with the mock key.
    #[command(flatten)]
    content: ContentArgs,
    /// Commitment to register when supplying a proof file.
    #[arg(long, requires = "proof")]
    hash: Option<StampHash>,
    /// Proof JSON produced by `prove`.
    #[arg(long, requires = "hash")]
    proof: Option<PathBuf>,
    /// With no signers: record the creator as the first signer.
    #[arg(long)]
    public: bool,
    /// Admitted signer; repeat for several.
    #[arg(long = "signer")]
    signers: Vec<Address>,
    /// Value attached to the call, taken from the caller's balance.
    #[arg(long, default_value_t = 0)]
    pay: Amount,
}

#[derive(Args)]
struct SignArgs {
    #[command(flatten)]
    call: CallArgs,
    #[arg(long)]
    hash: StampHash,
}

#[derive(Args)]
struct InfoArgs {
    #[arg(long)]
    hash: StampHash,
    #[arg(long)]
    offset: Option<u64>,
    #[arg(long)]
    limit: Option<u64>,
}

#[derive(Args)]
struct UserArgs {
    #[arg(long)]
    identity: Address,
    #[arg(long)]
    hash: StampHash,
}

#[derive(Args)]
struct HashesArgs {
    #[arg(long)]
    identity: Address,
    #[arg(long)]
    offset: Option<u64>,
    #[arg(long)]
    limit: Option<u64>,
}

#[derive(Args)]
struct HashArgs {
    #[arg(long)]
    hash: StampHash,
}

#[derive(Args)]
struct SetFeeArgs {
    #[command(flatten)]
    call: CallArgs,
    #[arg(long)]
    fee: Amount,
}

#[derive(Args)]
struct SetVerifierArgs {
    #[command(flatten)]
    call: CallArgs,
    #[arg(long)]
    verifier: VerifierRef,
}

#[derive(Args)]
struct WithdrawArgs {
    #[command(flatten)]
    call: CallArgs,
    #[arg(long)]
    to: Address,
}

#[derive(Args)]
struct TransferOwnershipArgs {
    #[command(flatten)]
    call: CallArgs,
    #[arg(long)]
    new_owner: Address,
}

#[derive(Args)]
struct DepositArgs {
    #[arg(long)]
    identity: Address,
    #[arg(long)]
    amount: Amount,
}

#[derive(Args)]
struct BalanceArgs {
    #[arg(long)]
    identity: Address,
}

#[derive(Args)]
struct EventsArgs {
    /// First sequence number to print.
    #[arg(long, default_value_t = 0)]
    since: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let key = MockKey::from_seed(&cli.key_seed);
    let out = Output { json: cli.json };

    match cli.command {
        Commands::Init(args) => init(&cli.state, key, out, args),
        Commands::Hash(args) => hash(out, args),
        Commands::Prove(args) => prove(key, out, args),
        Commands::VerifierRef => out.print(&json!({ "verifier": key.verifier_ref() }), || {
            key.verifier_ref().to_string()
        }),
        Commands::Create(args) => create(&cli.state, key, out, args),
        Commands::Sign(args) => sign(&cli.state, key, out, args),
        Commands::Info(args) => info(&cli.state, key, out, args),
        Commands::User(args) => user(&cli.state, key, out, args),
        Commands::Hashes(args) => hashes(&cli.state, key, out, args),
        Commands::SignersCount(args) => signers_count(&cli.state, key, out, args),
        Commands::SetFee(args) => set_fee(&cli.state, key, out, args),
        Commands::SetVerifier(args) => set_verifier(&cli.state, key, out, args),
        Commands::Withdraw(args) => withdraw(&cli.state, key, out, args),
        Commands::TransferOwnership(args) => transfer_ownership(&cli.state, key, out, args),
        Commands::Deposit(args) => deposit(&cli.state, key, out, args),
        Commands::Balance(args) => balance(&cli.state, key, out, args),
        Commands::Events(args) => events(&cli.state, key, out, args),
    }
}

// === State file ===

/// Everything the substrate persists between calls.
#[derive(Default, Serialize, Deserialize)]
struct StateFile {
    store: MemoryStore,
    #[serde(default)]
    events: EventLog,
    #[serde(default)]
    accounts: AccountBook,
}

struct Session {
    path: PathBuf,
    registry: StampRegistry,
    accounts: AccountBook,
}

impl Session {
    fn open(path: &Path, key: MockKey) -> Result<Self> {
        let state = if path.exists() {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<StateFile>(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            StateFile::default()
        };

        let directory = StaticDirectory::new().with(key.verifier_ref(), Arc::new(MockVerifier::new(key)));
        let registry = StampRegistry::new(state.store, Arc::new(directory))
            .map_err(|err| call_failed("open", err))?
            .with_events(state.events);
        Ok(Self {
            path: path.to_path_buf(),
            registry,
            accounts: state.accounts,
        })
    }

    fn save(self) -> Result<()> {
        let (store, events) = self.registry.into_parts();
        let state = StateFile {
            store,
            events,
            accounts: self.accounts,
        };
        let raw = serde_json::to_string_pretty(&state)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), events = state.events.len(), "state saved");
        Ok(())
    }
}

fn call_failed(op: &str, err: StampError) -> anyhow::Error {
    anyhow!("{op} failed [{}]: {err}", err.code())
}

fn page_limit() -> u64 {
    RegistryConfig::from_env()
        .map(|config| config.default_page_limit)
        .unwrap_or(DEFAULT_PAGE_LIMIT)
}

struct Output {
    json: bool,
}

impl Output {
    fn print<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}

// === Commands ===

fn init(path: &Path, key: MockKey, out: Output, args: InitArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(config_path) => RegistryConfig::from_file(config_path)?,
        None => RegistryConfig::from_env()?,
    };
    if let Some(fee) = args.fee {
        config.initial_fee = fee;
    }
    if let Some(owner) = args.owner {
        config.owner = Some(owner);
    }
    config.verifier = args
        .verifier
        .or(config.verifier)
        .or(Some(key.verifier_ref()));
    let params = config.init_params(args.call.caller)?;

    let mut session = Session::open(path, key)?;
    session
        .registry
        .initialize(args.call.context(), params)
        .map_err(|err| call_failed("init", err))?;
    let settings = session.registry.settings();
    session.save()?;

    out.print(&settings, || {
        format!(
            "initialized: owner {} fee {} verifier {}",
            params.owner, params.fee, params.verifier
        )
    })
}

fn hash(out: Output, args: ContentArgs) -> Result<()> {
    let hash = hash_by_bytes(&args.read()?);
    out.print(&json!({ "hash": hash }), || hash.to_string())
}

fn prove(key: MockKey, out: Output, args: ProveArgs) -> Result<()> {
    let content = args.content.read()?;
    let (hash, proof) = MockProver::new(key).prove_content(&content, args.caller);
    if let Some(path) = &args.out {
        fs::write(path, proof.to_json()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    out.print(&json!({ "hash": hash, "caller": args.caller, "proof": proof }), || {
        match &args.out {
            Some(path) => format!("hash {hash}\nproof written to {}", path.display()),
            None => format!("hash {hash}"),
        }
    })
}

fn create(path: &Path, key: MockKey, out: Output, args: CreateArgs) -> Result<()> {
    let ctx = args.call.context().paying(args.pay);
    let (hash, proof) = match (&args.hash, &args.proof) {
        (Some(hash), Some(proof_path)) => {
            let raw = fs::read_to_string(proof_path)
                .with_context(|| format!("failed to read {}", proof_path.display()))?;
            (*hash, StampProof::from_json(&raw)?)
        }
        _ if args.content.is_given() => {
            MockProver::new(key).prove_content(&args.content.read()?, ctx.caller)
        }
        _ => bail!("supply --file/--text, or --hash with --proof"),
    };

    let mut session = Session::open(path, key)?;
    let request = CreateStampRequest {
        hash,
        is_public: args.public,
        signers: args.signers,
        proof,
    };
    let created = session
        .registry
        .create_stamp(ctx, request, &mut session.accounts)
        .map_err(|err| call_failed("create", err))?;
    session.save()?;

    out.print(&created, || {
        format!(
            "created {} at {} with {} admitted signer(s)",
            created.hash,
            created.created_at,
            created.signers.len()
        )
    })
}

fn sign(path: &Path, key: MockKey, out: Output, args: SignArgs) -> Result<()> {
    let mut session = Session::open(path, key)?;
    let signed = session
        .registry
        .sign(args.call.context(), args.hash)
        .map_err(|err| call_failed("sign", err))?;
    session.save()?;
    out.print(&signed, || {
        format!("{} signed {} at {}", signed.signer, signed.hash, signed.timestamp)
    })
}

fn format_stamp(info: &StampInfo) -> String {
    let required = if info.is_public {
        "unbounded".to_string()
    } else {
        info.required_signers.to_string()
    };
    let mut lines = vec![
        format!("hash: {}", info.hash),
        format!("visibility: {}", if info.is_public { "public" } else { "admitted" }),
        format!("created_at: {}", info.created_at),
        format!("creator: {}", info.creator),
        format!("required_signers: {required}"),
        format!("signed: {}/{}", info.signed_count, info.total_signers),
    ];
    for record in &info.signers {
        let state = if record.is_signed() {
            format!("signed at {}", record.signed_at)
        } else {
            "pending".to_string()
        };
        let admitted = if record.admitted { " (admitted)" } else { "" };
        lines.push(format!("  {}{admitted}: {state}", record.identity));
    }
    lines.join("\n")
}

fn info(path: &Path, key: MockKey, out: Output, args: InfoArgs) -> Result<()> {
    let session = Session::open(path, key)?;
    let info = if args.offset.is_none() && args.limit.is_none() {
        session.registry.stamp_info(&args.hash)
    } else {
        session.registry.stamp_info_page(
            &args.hash,
            args.offset.unwrap_or(0),
            args.limit.unwrap_or_else(page_limit),
        )
    };
    let info = info.with_context(|| format!("no stamp for {}", args.hash))?;
    out.print(&info, || format_stamp(&info))
}

fn user(path: &Path, key: MockKey, out: Output, args: UserArgs) -> Result<()> {
    let session = Session::open(path, key)?;
    let user = session.registry.user_info(&args.identity, &args.hash);
    out.print(&user, || {
        format!("admitted: {}\nsigned_at: {}", user.admitted, user.signed_at)
    })
}

fn hashes(path: &Path, key: MockKey, out: Output, args: HashesArgs) -> Result<()> {
    let session = Session::open(path, key)?;
    let hashes = if args.offset.is_none() && args.limit.is_none() {
        session.registry.hashes_by_user(&args.identity)
    } else {
        session.registry.hashes_by_user_page(
            &args.identity,
            args.offset.unwrap_or(0),
            args.limit.unwrap_or_else(page_limit),
        )
    };
    out.print(&hashes, || {
        hashes
            .iter()
            .map(StampHash::to_hex)
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn signers_count(path: &Path, key: MockKey, out: Output, args: HashArgs) -> Result<()> {
    let session = Session::open(path, key)?;
    let count = session.registry.stamp_signers_count(&args.hash);
    out.print(&json!({ "hash": args.hash, "signers": count }), || count.to_string())
}

fn set_fee(path: &Path, key: MockKey, out: Output, args: SetFeeArgs) -> Result<()> {
    let mut session = Session::open(path, key)?;
    session
        .registry
        .set_fee(args.call.context(), args.fee)
        .map_err(|err| call_failed("set-fee", err))?;
    session.save()?;
    out.print(&json!({ "fee": args.fee }), || format!("fee set to {}", args.fee))
}

fn set_verifier(path: &Path, key: MockKey, out: Output, args: SetVerifierArgs) -> Result<()> {
    let mut session = Session::open(path, key)?;
    session
        .registry
        .set_verifier(args.call.context(), args.verifier)
        .map_err(|err| call_failed("set-verifier", err))?;
    session.save()?;
    out.print(&json!({ "verifier": args.verifier }), || {
        format!("verifier set to {}", args.verifier)
    })
}

fn withdraw(path: &Path, key: MockKey, out: Output, args: WithdrawArgs) -> Result<()> {
    let mut session = Session::open(path, key)?;
    let amount = session
        .registry
        .withdraw_fee(args.call.context(), args.to, &mut session.accounts)
        .map_err(|err| call_failed("withdraw", err))?;
    session.save()?;
    out.print(&json!({ "to": args.to, "amount": amount.to_string() }), || {
        format!("withdrew {amount} to {}", args.to)
    })
}

fn transfer_ownership(
    path: &Path,
    key: MockKey,
    out: Output,
    args: TransferOwnershipArgs,
) -> Result<()> {
    let mut session = Session::open(path, key)?;
    session
        .registry
        .transfer_ownership(args.call.context(), args.new_owner)
        .map_err(|err| call_failed("transfer-ownership", err))?;
    session.save()?;
    out.print(&json!({ "owner": args.new_owner }), || {
        format!("ownership transferred to {}", args.new_owner)
    })
}

fn deposit(path: &Path, key: MockKey, out: Output, args: DepositArgs) -> Result<()> {
    let mut session = Session::open(path, key)?;
    let balance = session
        .accounts
        .deposit(args.identity, args.amount)
        .with_context(|| format!("failed to fund {}", args.identity))?;
    session.save()?;
    out.print(
        &json!({ "identity": args.identity, "balance": balance.to_string() }),
        || format!("{} now holds {balance}", args.identity),
    )
}

fn balance(path: &Path, key: MockKey, out: Output, args: BalanceArgs) -> Result<()> {
    let session = Session::open(path, key)?;
    let balance = session.accounts.balance(&args.identity);
    out.print(
        &json!({ "identity": args.identity, "balance": balance.to_string() }),
        || balance.to_string(),
    )
}

fn events(path: &Path, key: MockKey, out: Output, args: EventsArgs) -> Result<()> {
    let session = Session::open(path, key)?;
    let events = session.registry.events().since(args.since);
    out.print(&events, || {
        events
            .iter()
            .map(|recorded| {
                let detail = serde_json::to_string(&recorded.event).unwrap_or_default();
                format!("{:>4} {} {detail}", recorded.sequence, recorded.event.name())
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn current_unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
