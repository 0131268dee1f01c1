//! Streaming platforms, play reports and listening aggregates.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use cz_02_chain_state::{
        ErrorCategory, ListenerByPlatformUser, ListeningAggregates, PseudonymousListener, Report,
    };
    use shared_types::constants::{LISTENING_WINDOW_SECONDS, MAX_LISTENING_TIME_PER_DAY};
    use shared_types::{
        AccountName, Asset, Authority, Consumer, ContentCreateOperation, ContentDisableOperation,
        Operation, RequestStreamReportingOperation, StreamingPlatformReportOperation,
        StreamingPlatformUpdateOperation,
    };

    const TRACK: &str = "ipfs://track-1";

    struct Setup {
        chain: TestChain,
        platform: AccountName,
        artist: AccountName,
        listener: AccountName,
    }

    fn setup() -> Setup {
        let mut chain = TestChain::new();
        let platform = chain.create_account("sonic");
        let artist = chain.create_account("artist");
        let listener = chain.create_account("alice");
        let fee = chain.db.config().streaming_platform_creation_fee;
        chain.fund(&platform, fee);
        chain
            .push(vec![
                StreamingPlatformUpdateOperation {
                    owner: platform.clone(),
                    url: "https://sonic.example".to_string(),
                    fee: Asset::core(fee),
                }
                .into(),
                ContentCreateOperation {
                    uploader: artist.clone(),
                    url: TRACK.to_string(),
                    title: "Track One".to_string(),
                    manage_master: Authority::account(artist.clone()),
                    manage_comp: None,
                }
                .into(),
            ])
            .unwrap();
        Setup {
            chain,
            platform,
            artist,
            listener,
        }
    }

    fn report(platform: &AccountName, consumer: Consumer, play_time: u32) -> StreamingPlatformReportOperation {
        StreamingPlatformReportOperation {
            streaming_platform: platform.clone(),
            reporter: None,
            consumer,
            content: TRACK.to_string(),
            play_time,
            playlist_creator: None,
            spinning_platform: None,
        }
    }

    fn by(platform: &AccountName, consumer: Consumer, play_time: u32) -> Operation {
        report(platform, consumer, play_time).into()
    }

    #[test]
    fn test_daily_listening_cap() {
        let Setup {
            mut chain,
            platform,
            listener,
            ..
        } = setup();
        let alice = Consumer::Account(listener.clone());

        chain.push(vec![by(&platform, alice.clone(), 86_300)]).unwrap();
        let err = chain.push(vec![by(&platform, alice, 200)]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::PreconditionFailed);

        let account = chain.account("alice");
        assert_eq!(account.total_listening_time, 86_300);
        assert!(account.total_listening_time <= MAX_LISTENING_TIME_PER_DAY);
        assert_eq!(account.listening_time_by_platform[&platform], 86_300);
        assert_eq!(chain.db.store().table::<Report>().iter().count(), 1);

        let global = chain.db.global().unwrap().aggregates;
        assert_eq!(global.total_listening_time, 86_300);
        assert_eq!(global.active_users, 1);
        assert_eq!(global.full_time_users, 1);
        let sonic = chain.db.get_streaming_platform(&platform).unwrap();
        assert_eq!(sonic.aggregates, global);

        let track = chain.db.get_content(TRACK).unwrap();
        assert_eq!(track.times_played, 1);
        assert_eq!(track.total_listening_time_24, 86_300);
    }

    #[test]
    fn test_reports_expire_after_the_window() {
        let Setup {
            mut chain,
            platform,
            listener,
            ..
        } = setup();
        chain
            .push(vec![by(&platform, Consumer::Account(listener), 3_600)])
            .unwrap();
        assert_eq!(chain.db.global().unwrap().aggregates.full_time_users, 1);

        chain.skip_time(LISTENING_WINDOW_SECONDS);

        let account = chain.account("alice");
        assert_eq!(account.total_listening_time, 0);
        assert!(account.listening_time_by_platform.is_empty());
        assert_eq!(chain.db.global().unwrap().aggregates, ListeningAggregates::default());
        assert_eq!(chain.db.store().table::<Report>().iter().count(), 0);

        let track = chain.db.get_content(TRACK).unwrap();
        assert_eq!(track.times_played, 1);
        assert_eq!(track.times_played_24, 0);
        assert_eq!(track.total_listening_time_24, 0);
    }

    #[test]
    fn test_pseudonymous_and_anonymous_subjects() {
        let Setup {
            mut chain, platform, ..
        } = setup();

        chain
            .push(vec![
                by(&platform, Consumer::Pseudonymous(7), 100),
                by(&platform, Consumer::Pseudonymous(7), 50),
                by(&platform, Consumer::Anonymous, 30),
            ])
            .unwrap();

        let listener = chain
            .db
            .store()
            .find_by::<PseudonymousListener, ListenerByPlatformUser>(&(platform.clone(), 7))
            .expect("listener");
        assert_eq!(listener.total_listening_time, 150);

        let sonic = chain.db.get_streaming_platform(&platform).unwrap();
        assert_eq!(sonic.anonymous_listening_time, 30);
        assert_eq!(sonic.aggregates.active_users, 2);
        assert_eq!(sonic.aggregates.total_listening_time, 180);
        assert_eq!(chain.db.global().unwrap().aggregates, sonic.aggregates);
    }

    #[test]
    fn test_reporter_needs_a_reporting_request() {
        let Setup {
            mut chain,
            platform,
            listener,
            ..
        } = setup();
        let mut via_reporter = report(&platform, Consumer::Pseudonymous(1), 60);
        via_reporter.reporter = Some(listener.clone());

        let err = chain.push(vec![via_reporter.clone().into()]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);

        chain
            .push(vec![RequestStreamReportingOperation {
                requestor: platform.clone(),
                reporter: listener,
                reward_pct: 1_000,
                redelegate_pct: 0,
            }
            .into()])
            .unwrap();
        chain.push(vec![via_reporter.into()]).unwrap();

        let stored = chain
            .db
            .store()
            .table::<Report>()
            .iter()
            .next()
            .cloned()
            .expect("report");
        assert_eq!(stored.reward_pct, Some(1_000));
    }

    #[test]
    fn test_disabled_content_takes_no_reports() {
        let Setup {
            mut chain, platform, ..
        } = setup();
        chain
            .push(vec![ContentDisableOperation {
                url: TRACK.to_string(),
            }
            .into()])
            .unwrap();

        let err = chain
            .push(vec![by(&platform, Consumer::Anonymous, 60)])
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::PreconditionFailed);
    }

    #[test]
    fn test_content_reward_follows_listening() {
        let Setup {
            mut chain,
            platform,
            artist,
            listener,
        } = setup();
        chain
            .push(vec![by(&platform, Consumer::Account(listener), 600)])
            .unwrap();

        // reach the first payout while the report is still inside the window
        chain.skip_time(LISTENING_WINDOW_SECONDS - 10);

        let payout = chain.db.get_content(TRACK).unwrap().accumulated_payout;
        assert!(payout > 0);
        assert_eq!(chain.db.get_account(&artist).unwrap().balance, payout);
        assert_eq!(chain.db.global().unwrap().total_reward_fund, 0);
    }
}
