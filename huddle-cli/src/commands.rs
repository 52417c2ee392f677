use crate::prompt;
use anyhow::{Result, bail};
use colored::*;
use huddle::error::{AdmissionError, MediaError};
use huddle::model::{Participant, ShareState};
use huddle::session::{
    Admitted, FileChannel, GateState, MemoryChannel, NegotiationEngine, ParticipantGate,
    RtcPeerFactory, SessionCoordinator, SharedChannel, SyntheticDevices, TransportConfig,
};
use huddle::{HuddleConfig, Role};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

fn coordinator(config: &HuddleConfig, channel: Arc<dyn SharedChannel>) -> SessionCoordinator {
    let peers = Arc::new(RtcPeerFactory::new(TransportConfig::from(config)));
    SessionCoordinator::new(
        config.clone(),
        channel,
        Arc::new(SyntheticDevices::new()),
        peers,
    )
}

pub async fn host(config: HuddleConfig, store: PathBuf) -> Result<()> {
    println!("{}", "📡 Huddle host".green().bold());
    println!("   📂 Store: {}", store.display());

    let mut session = coordinator(&config, Arc::new(FileChannel::new(store)));
    let mut gate = session.gate();

    let admitted = loop {
        let code = prompt::text("Host code").await?;
        match gate.enter_code(&code).await {
            Ok(GateState::Admitted(admitted)) => break admitted.clone(),
            Ok(_) => {
                println!("{}", "That is a participant code. Use `huddle join`.".yellow());
            }
            Err(e) => println!("{}", e.to_string().red()),
        }
        gate.reset();
    };

    let engine = session.enter(&admitted).await?;
    report_media(&engine).await;
    spawn_status(&engine);
    println!("{}", "✨ Session open, waiting for participants...".green().bold());

    let mut notices = session.pending_notices();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = notices.changed() => {
                if changed.is_err() {
                    break;
                }
                let pending = notices.borrow_and_update().clone();
                if let Some(participant) = pending {
                    decide(&session, participant).await?;
                }
            }
        }
    }

    session.leave().await;
    println!("{}", "👋 Session closed".cyan());
    Ok(())
}

async fn decide(session: &SessionCoordinator, participant: Participant) -> Result<()> {
    let question = format!("{} is waiting. Let them in?", participant.name.bold());
    if prompt::confirm(question).await? {
        session.approve_pending().await?;
        println!("{} {}", "✅ Approved".green(), participant.name);
    } else {
        session.decline_pending().await?;
        println!("{} {}", "🚫 Declined".yellow(), participant.name);
    }
    Ok(())
}

pub async fn join(config: HuddleConfig, store: PathBuf) -> Result<()> {
    println!("{}", "📡 Huddle".green().bold());

    let mut session = coordinator(&config, Arc::new(FileChannel::new(store)));
    let mut gate = session.gate();

    loop {
        enter_code(&mut gate).await?;
        if gate.admitted().is_some() {
            println!("{}", "That is the host code. Use `huddle host`.".yellow());
        } else if enter_name(&mut gate).await? {
            break;
        }
        gate.reset();
    }

    println!("{}", "⏳ Waiting for the host to let you in...".cyan());
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        interrupt.cancel();
    });

    let Some(admitted) = gate.wait_for_admission(cancel).await? else {
        bail!("Stopped waiting for approval");
    };

    run_until_interrupted(&mut session, &admitted).await
}

async fn enter_code(gate: &mut ParticipantGate) -> Result<()> {
    loop {
        let code = prompt::text("Entry code").await?;
        match gate.enter_code(&code).await {
            Ok(_) => return Ok(()),
            Err(e) => {
                println!("{}", e.to_string().red());
                gate.reset();
            }
        }
    }
}

/// `false` when the code turned out to be spent and must be entered again.
async fn enter_name(gate: &mut ParticipantGate) -> Result<bool> {
    loop {
        let name = prompt::text("Your name").await?;
        match gate.enter_name(&name).await {
            Ok(_) => return Ok(true),
            Err(AdmissionError::InvalidCode) => {
                println!("{}", AdmissionError::InvalidCode.to_string().red());
                return Ok(false);
            }
            Err(
                e @ (AdmissionError::EmptyName
                | AdmissionError::ReservedName
                | AdmissionError::PendingOccupied),
            ) => {
                println!("{}", e.to_string().yellow());
            }
            Err(e) => return Err(e.into()),
        }
    }
}

async fn run_until_interrupted(session: &mut SessionCoordinator, admitted: &Admitted) -> Result<()> {
    let engine = session.enter(admitted).await?;
    report_media(&engine).await;
    spawn_status(&engine);
    println!(
        "{} {}",
        "✨ Joined as".green().bold(),
        admitted.identity.as_str().bold()
    );

    let _ = tokio::signal::ctrl_c().await;
    session.leave().await;
    println!("{}", "👋 Left the session".cyan());
    Ok(())
}

async fn report_media(engine: &NegotiationEngine) {
    let Some(e) = engine.last_media_error().await else {
        return;
    };
    println!("{}", e.to_string().yellow());
    if e == MediaError::PermissionDenied {
        println!("{}", "   Continuing without local media.".dimmed());
    }
}

fn spawn_status(engine: &Arc<NegotiationEngine>) {
    let mut connection = engine.subscribe_connection_state();
    let mut share = engine.subscribe_share_state();
    let cancel = engine.cancel_token().clone();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = connection.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = *connection.borrow_and_update();
                    println!("   🔗 Connection {:?}", state);
                }
                changed = share.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = *share.borrow_and_update();
                    let label = match state {
                        ShareState::CameraSharing => "camera",
                        ShareState::ScreenSharing => "screen",
                    };
                    println!("   🎥 Sharing {label}");
                }
            }
        }
    });
}

/// Host and participant in one process. Approves automatically and reports
/// once both sides hold a remote description.
pub async fn demo(config: HuddleConfig) -> Result<()> {
    println!("{}", "🚀 Huddle demo".green().bold());

    let channel = MemoryChannel::new();
    let mut host = coordinator(&config, Arc::new(channel.clone()));
    let mut guest = coordinator(&config, Arc::new(channel.clone()));

    let host_engine = host
        .enter(&Admitted {
            role: Role::Host,
            identity: config.host_identity.clone(),
        })
        .await?;
    println!("   📡 Host {} published an offer", config.host_identity);

    let mut gate = guest.gate();
    let Some(code) = config.student_codes.first() else {
        bail!("No student codes configured");
    };
    gate.enter_code(code.as_str()).await?;
    gate.enter_name("Guest").await?;

    let mut notices = host.pending_notices();
    notices.wait_for(|p| p.is_some()).await?;
    host.approve_pending().await?;
    println!("   ✅ Approved Guest");

    let Some(admitted) = gate.wait_for_admission(CancellationToken::new()).await? else {
        bail!("Guest was never admitted");
    };
    let guest_engine = guest.enter(&admitted).await?;

    let deadline = tokio::time::Instant::now() + config.poll_interval() * 10;
    while !(host_engine.has_remote_description().await
        && guest_engine.has_remote_description().await)
    {
        if tokio::time::Instant::now() > deadline {
            warn!("Negotiation did not finish in time");
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let ok = host_engine.has_remote_description().await && guest_engine.has_remote_description().await;
    if ok {
        println!("{}", "✨ Offer and answer exchanged through the store".green().bold());
    } else {
        println!("{}", "❌ Negotiation incomplete".red().bold());
    }

    guest.leave().await;
    host.leave().await;

    if !ok {
        bail!("Demo negotiation failed");
    }
    Ok(())
}
