use clap::{Args, Parser, Subcommand};
use paymybuddy::app::App;
use paymybuddy::config::{ClientConfig, ConfigError};
use paymybuddy::error::ApiError;
use paymybuddy::fees;
use paymybuddy::navigation::Navigation;
use paymybuddy::net::types::{BankAccount, BankTransferRequest, PageRequest, Registration, TransactionRequest, UserUpdate};
use paymybuddy::routes::Route;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Login(&'static str),
    #[error("cannot open {requested}; redirected to {location}")]
    Denied { requested: String, location: Route },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl From<Navigation> for CliError {
    fn from(navigation: Navigation) -> Self {
        Self::Denied { requested: navigation.requested, location: navigation.location }
    }
}

#[derive(Parser, Debug)]
#[command(name = "paymybuddy", about = "PayMyBuddy client")]
struct Cli {
    #[arg(long, env = "PAYMYBUDDY_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "PAYMYBUDDY_STATE_DIR", help = "Where the session snapshot is kept")]
    state_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PAYMYBUDDY_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value_t = false, help = "Keep the session across restarts")]
        remember: bool,
    },
    Logout,
    Whoami,
    Register {
        #[arg(long)]
        firstname: String,
        #[arg(long)]
        lastname: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "PAYMYBUDDY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Navigate to a path the way the web client would.
    Open { path: String },
    Home,
    Profile(ProfileCommand),
    Connection(ConnectionCommand),
    BankAccount(BankAccountCommand),
    BankTransfer(BankTransferCommand),
    Transaction(TransactionCommand),
    Admin(AdminCommand),
}

#[derive(Args, Debug)]
struct PageArgs {
    #[arg(long, default_value_t = 0)]
    page: u32,
    #[arg(long, default_value_t = PageRequest::DEFAULT_SIZE)]
    size: u32,
}

impl PageArgs {
    fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.size)
    }
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    Update {
        #[arg(long)]
        firstname: Option<String>,
        #[arg(long)]
        lastname: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Delete the account and end the session.
    Delete,
}

#[derive(Args, Debug)]
struct ConnectionCommand {
    #[command(subcommand)]
    command: ConnectionSubcommand,
}

#[derive(Subcommand, Debug)]
enum ConnectionSubcommand {
    List(PageArgs),
    Add { email: String },
    Remove { connection_id: i64 },
}

#[derive(Args, Debug)]
struct BankAccountCommand {
    #[command(subcommand)]
    command: BankAccountSubcommand,
}

#[derive(Subcommand, Debug)]
enum BankAccountSubcommand {
    List(PageArgs),
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        iban: String,
        #[arg(long)]
        bic: String,
    },
    Remove { bank_account_id: i64 },
}

#[derive(Args, Debug)]
struct BankTransferCommand {
    #[command(subcommand)]
    command: BankTransferSubcommand,
}

#[derive(Subcommand, Debug)]
enum BankTransferSubcommand {
    List(PageArgs),
    Request {
        #[arg(long)]
        bank_account_id: i64,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value_t = false, help = "Move money from the bank into the wallet")]
        income: bool,
    },
}

#[derive(Args, Debug)]
struct TransactionCommand {
    #[command(subcommand)]
    command: TransactionSubcommand,
}

#[derive(Subcommand, Debug)]
enum TransactionSubcommand {
    List(PageArgs),
    Send {
        #[arg(long, help = "Connection id of the receiver")]
        to: i64,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "")]
        description: String,
    },
}

#[derive(Args, Debug)]
struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    Show,
    Users(PageArgs),
    DeleteUser { user_id: i64 },
    Enable {
        user_id: i64,
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        enabled: bool,
    },
    Transactions(PageArgs),
    BankTransfers(PageArgs),
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url.as_deref() {
        config = config.with_base_url(base_url)?;
    }
    if let Some(state_dir) = cli.state_dir {
        config.state_dir = Some(state_dir);
    }
    let app = App::new(config)?;

    match cli.command {
        Command::Login { email, password, remember } => run_login(&app, &email, &password, remember).await,
        Command::Logout => {
            app.session.logoff().await?;
            println!("logged out");
            Ok(())
        }
        Command::Whoami => print_json(&app.session.identity()),
        Command::Register { firstname, lastname, email, password } => {
            let registration = Registration { firstname, lastname, email, password };
            let user = app.session.register(&registration).await?;
            print_json(&user)
        }
        Command::Open { path } => run_open(&app, &path),
        Command::Home => run_home(&app).await,
        Command::Profile(profile) => run_profile(&app, profile).await,
        Command::Connection(connection) => run_connection(&app, connection).await,
        Command::BankAccount(account) => run_bank_account(&app, account).await,
        Command::BankTransfer(transfer) => run_bank_transfer(&app, transfer).await,
        Command::Transaction(transaction) => run_transaction(&app, transaction).await,
        Command::Admin(admin) => run_admin(&app, admin).await,
    }
}

async fn run_login(app: &App, email: &str, password: &str, remember: bool) -> Result<(), CliError> {
    let identity = app
        .session
        .login(email, password, remember)
        .await
        .map_err(|err| CliError::Login(err.login_message()))?;
    let landed = app.navigator.after_login();
    println!("logged in as {} ({})", identity.display_name(), identity.email);
    println!("now at {}", landed.location);
    Ok(())
}

fn run_open(app: &App, path: &str) -> Result<(), CliError> {
    let navigation = app.navigator.navigate(path);
    let trail = navigation
        .location
        .breadcrumbs()
        .into_iter()
        .map(Route::title)
        .collect::<Vec<_>>()
        .join(" > ");
    if navigation.redirected {
        println!("{path} -> {}", navigation.location);
    } else {
        println!("{}", navigation.location);
    }
    println!("{trail}");
    Ok(())
}

async fn run_home(app: &App) -> Result<(), CliError> {
    let identity = app.enter(Route::Home)?;
    let user = app.api.user(identity.user_id).await?;
    let accounts = app.api.bank_accounts(identity.user_id, PageRequest::default()).await?;
    println!("Hello {} {}", user.firstname, user.lastname);
    println!("wallet: {:.2}", user.wallet);
    print_json(&accounts)
}

async fn run_profile(app: &App, profile: ProfileCommand) -> Result<(), CliError> {
    let identity = app.enter(Route::Profile)?;
    match profile.command {
        ProfileSubcommand::Show => {
            let user = app.api.user(identity.user_id).await?;
            print_json(&user)
        }
        ProfileSubcommand::Update { firstname, lastname, email, password } => {
            let current = app.api.user(identity.user_id).await?;
            let mut update = UserUpdate::from(&current);
            if let Some(firstname) = firstname {
                update.firstname = firstname;
            }
            if let Some(lastname) = lastname {
                update.lastname = lastname;
            }
            if let Some(email) = email {
                update.email = email;
            }
            update.password = password;
            let updated = app.api.update_user(&update).await?;
            print_json(&updated)
        }
        ProfileSubcommand::Delete => {
            app.api.delete_user(identity.user_id).await?;
            app.session.logoff().await?;
            println!("account deleted");
            Ok(())
        }
    }
}

async fn run_connection(app: &App, connection: ConnectionCommand) -> Result<(), CliError> {
    let identity = app.enter(Route::Transfer)?;
    match connection.command {
        ConnectionSubcommand::List(page) => {
            let connections = app.api.connections(identity.user_id, page.request()).await?;
            print_json(&connections)
        }
        ConnectionSubcommand::Add { email } => {
            let added = app.api.add_connection(identity.user_id, &email).await?;
            print_json(&added)
        }
        ConnectionSubcommand::Remove { connection_id } => {
            app.api.delete_connection(identity.user_id, connection_id).await?;
            println!("connection {connection_id} removed");
            Ok(())
        }
    }
}

async fn run_bank_account(app: &App, account: BankAccountCommand) -> Result<(), CliError> {
    let identity = app.enter(Route::Home)?;
    match account.command {
        BankAccountSubcommand::List(page) => {
            let accounts = app.api.bank_accounts(identity.user_id, page.request()).await?;
            print_json(&accounts)
        }
        BankAccountSubcommand::Add { title, iban, bic } => {
            let account = BankAccount { title, iban, bic, user_id: identity.user_id, ..BankAccount::default() };
            let added = app.api.add_bank_account(identity.user_id, &account).await?;
            print_json(&added)
        }
        BankAccountSubcommand::Remove { bank_account_id } => {
            app.api.delete_bank_account(identity.user_id, bank_account_id).await?;
            println!("bank account {bank_account_id} removed");
            Ok(())
        }
    }
}

async fn run_bank_transfer(app: &App, transfer: BankTransferCommand) -> Result<(), CliError> {
    let identity = app.enter(Route::Home)?;
    match transfer.command {
        BankTransferSubcommand::List(page) => {
            let transfers = app.api.bank_transfers(identity.user_id, page.request()).await?;
            print_json(&transfers)
        }
        BankTransferSubcommand::Request { bank_account_id, amount, income } => {
            let request = BankTransferRequest { user_id: identity.user_id, bank_account_id, amount, income };
            let done = app.api.request_bank_transfer(&request).await?;
            print_json(&done)
        }
    }
}

async fn run_transaction(app: &App, transaction: TransactionCommand) -> Result<(), CliError> {
    let identity = app.enter(Route::Transfer)?;
    match transaction.command {
        TransactionSubcommand::List(page) => {
            let transactions = app.api.transactions(identity.user_id, page.request()).await?;
            print_json(&transactions)
        }
        TransactionSubcommand::Send { to, amount, description } => {
            println!(
                "sending {amount:.2} (fee {:.2}, total {:.2})",
                fees::transaction_fee(amount),
                fees::total_debit(amount)
            );
            let request = TransactionRequest { emitter_id: identity.user_id, receiver_id: to, description, amount };
            let done = app.api.request_transaction(&request).await?;
            print_json(&done)
        }
    }
}

async fn run_admin(app: &App, admin: AdminCommand) -> Result<(), CliError> {
    match admin.command {
        AdminSubcommand::Show => {
            let identity = app.enter(Route::Admin)?;
            let user = app.api.user(identity.user_id).await?;
            print_json(&user)
        }
        AdminSubcommand::Users(page) => {
            app.enter(Route::AdminUsers)?;
            print_json(&app.api.users(page.request()).await?)
        }
        AdminSubcommand::DeleteUser { user_id } => {
            app.enter(Route::AdminUsers)?;
            app.api.delete_user(user_id).await?;
            println!("user {user_id} deleted");
            Ok(())
        }
        AdminSubcommand::Enable { user_id, enabled } => {
            app.enter(Route::AdminUsers)?;
            app.api.set_user_enabled(user_id, enabled).await?;
            println!("user {user_id} enabled={enabled}");
            Ok(())
        }
        AdminSubcommand::Transactions(page) => {
            app.enter(Route::AdminTransactions)?;
            print_json(&app.api.all_transactions(page.request()).await?)
        }
        AdminSubcommand::BankTransfers(page) => {
            app.enter(Route::AdminBankTransfers)?;
            print_json(&app.api.all_bank_transfers(page.request()).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
