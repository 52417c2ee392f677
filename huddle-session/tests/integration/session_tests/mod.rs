mod test_host_and_participant_negotiate;
mod test_restart_clears_stale_keys;
mod test_rtc_peers_negotiate_over_store;
