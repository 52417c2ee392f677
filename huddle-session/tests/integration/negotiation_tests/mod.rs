mod test_answer_applied_once_and_consumed;
mod test_candidate_consumed_once;
mod test_media_falls_back_to_video_only;
mod test_offer_applied_once;
mod test_screen_share_reverts_when_ended;
