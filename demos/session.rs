// demos/session.rs
// Run with:
//   RUST_LOG=idle_core=debug cargo run --example session

use idle_core::state::Slot;
use idle_core::{Catalog, Game, Tuning};
use tracing_subscriber::EnvFilter;

fn main() -> idle_core::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut now: u64 = 1_700_000_000_000;
    let mut game = Game::new(Catalog::standard(), Tuning::default(), 42, now)?;

    // Ten simulated minutes: click five times a second, buy whatever is cheapest.
    for step in 0..2_000u32 {
        now += 300;
        game.advance(now);
        if game.state().golden.is_visible(now) {
            game.golden_click(now)?;
        }
        if step % 2 == 0 {
            for _ in 0..3 {
                game.click(now);
            }
        }
        let cheapest = game
            .catalog()
            .producers
            .iter()
            .filter_map(|p| game.cost_of(&p.id, 1, now).ok().map(|c| (p.id.clone(), c)))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((id, cost)) = cheapest {
            if game.state().balance >= cost {
                let _ = game.buy(&id, 1, now);
            }
        }
        for notice in game.drain_notices() {
            println!("[{:?}] {}", notice.tone, notice.message);
        }
    }

    let blob = game.save(now)?;
    let s = game.state();
    let rates = game.rates(now);
    println!("== Session Outcome ==");
    println!("balance      {:.0}", s.balance);
    println!("lifetime     {:.0}", s.lifetime);
    println!("production   {:.2}/s", rates.production);
    println!("click        {:.2}", rates.click);
    println!("clicks       {}", s.clicks);
    println!("secondary    {:.3} ({} units)", s.secondary.balance, s.secondary.minted_units);
    println!("golden       {} caught", s.golden.caught);
    println!("achievements {:?}", s.achievements);
    for slot in Slot::ALL {
        let log = s.missions.get(slot);
        println!("{slot:?}: {} completed, active = {:?}", log.completed, s.objectives.get(slot).map(|o| &o.template_id));
    }
    println!("save blob    {} bytes", blob.len());

    // Come back two hours later.
    now += 2 * 60 * 60 * 1_000;
    let mut back = Game::load(Catalog::standard(), Tuning::default(), 7, &blob, now)?;
    if let Some(amount) = back.resume(now) {
        println!("offline grant {amount:.0}");
    }
    Ok(())
}
